//! Test helpers for inbound HTTP components.

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::test as actix_test;
use serde_json::Value;

use crate::domain::LoginCredentials;
use crate::domain::ports::RegisterUserRequest;
use crate::domain::{Email, Password, UserName};
use crate::inbound::http::state::HttpState;

pub(crate) const PASSWORD: &str = "testpass123";

/// Register `email` through the account port and return a fresh API token.
pub(crate) async fn token_for(state: &HttpState, email: &str) -> String {
    state
        .users
        .register(RegisterUserRequest {
            email: Email::parse(email).expect("valid email"),
            password: Password::new(PASSWORD).expect("valid password"),
            name: UserName::default(),
        })
        .await
        .expect("registration succeeds");
    let credentials = LoginCredentials::try_from_parts(email, PASSWORD).expect("credentials");
    state
        .users
        .issue_token(&credentials)
        .await
        .expect("token issued")
        .expose()
        .to_owned()
}

/// Attach `Authorization: Token <token>`.
pub(crate) fn with_token(request: actix_test::TestRequest, token: &str) -> actix_test::TestRequest {
    request.insert_header((header::AUTHORIZATION, format!("Token {token}")))
}

/// Decode a JSON response body.
pub(crate) async fn json_body<B: MessageBody>(response: ServiceResponse<B>) -> Value {
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}

/// Field named in a validation error envelope.
pub(crate) fn error_field(body: &Value) -> Option<&str> {
    body.get("details")
        .and_then(|details| details.get("field"))
        .and_then(Value::as_str)
}
