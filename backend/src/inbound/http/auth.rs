//! Token authentication extractor.
//!
//! Handlers that take an [`Authenticated`] argument only run for requests
//! carrying `Authorization: Token <key>` (or `Bearer <key>`) that resolves to
//! an active user.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{AuthToken, Error, User, UserId};

use super::state::HttpState;

const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// The user behind a valid API token.
#[derive(Debug, Clone)]
pub struct Authenticated(User);

impl Authenticated {
    /// The authenticated account.
    pub fn user(&self) -> &User {
        &self.0
    }

    /// Identifier used to scope every owned resource.
    pub fn id(&self) -> UserId {
        self.0.id()
    }

    /// Consume the wrapper.
    pub fn into_inner(self) -> User {
        self.0
    }
}

/// Extract the token from an `Authorization` header value.
///
/// Returns an error message suitable for a 401 response when the header is
/// malformed.
pub(crate) fn parse_authorization(value: &str) -> Result<AuthToken, &'static str> {
    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or_default();
    if !SCHEMES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(scheme))
    {
        return Err("Authentication credentials were not provided.");
    }
    let key = parts
        .next()
        .ok_or("Invalid token header. No credentials provided.")?;
    if parts.next().is_some() {
        return Err("Invalid token header. Token string should not contain spaces.");
    }
    AuthToken::from_presented(key).ok_or("Invalid token.")
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = match req.headers().get(header::AUTHORIZATION) {
            None => Err("Authentication credentials were not provided."),
            Some(value) => value
                .to_str()
                .map_err(|_| "Invalid token header. Token string should not contain invalid characters.")
                .and_then(parse_authorization),
        };

        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = token.map_err(|message| {
                debug!(reason = message, "rejecting unauthenticated request");
                Error::unauthorized(message)
            })?;
            let user = state.users.resolve_token(&token).await?;
            Ok(Self(user))
        })
    }
}
