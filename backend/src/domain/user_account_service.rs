//! Account management and token authentication.
//!
//! Implements [`UserAccounts`] over the user and token repositories and a
//! password hasher.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    AuthTokenRepository, AuthTokenRepositoryError, PasswordHasher, PasswordHasherError,
    ProfileUpdate, RegisterUserRequest, UserAccounts, UserRepository, UserRepositoryError,
};
use crate::domain::{
    AuthToken, Error, LoginCredentials, NewUser, User, UserChanges, UserFlags, UserId,
};

/// Message returned for every failed credential check.
const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials";

/// Account service implementing [`UserAccounts`].
#[derive(Clone)]
pub struct UserAccountService<U, T, H> {
    users: Arc<U>,
    tokens: Arc<T>,
    hasher: Arc<H>,
}

impl<U, T, H> UserAccountService<U, T, H> {
    /// Create a service over the given adapters.
    pub fn new(users: Arc<U>, tokens: Arc<T>, hasher: Arc<H>) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }
}

impl<U, T, H> UserAccountService<U, T, H>
where
    U: UserRepository,
    T: AuthTokenRepository,
    H: PasswordHasher,
{
    fn map_user_error(error: UserRepositoryError) -> Error {
        match error {
            UserRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserRepositoryError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserRepositoryError::DuplicateEmail { .. } => Error::invalid_field(
                "email",
                "unique",
                "user with this email already exists",
            ),
        }
    }

    fn map_token_error(error: AuthTokenRepositoryError) -> Error {
        match error {
            AuthTokenRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("token repository unavailable: {message}"))
            }
            AuthTokenRepositoryError::Query { message } => {
                Error::internal(format!("token repository error: {message}"))
            }
        }
    }

    fn map_hasher_error(error: PasswordHasherError) -> Error {
        Error::internal(error.to_string())
    }

    fn bad_credentials() -> Error {
        Error::invalid_request(BAD_CREDENTIALS).with_details(json!({
            "field": "non_field_errors",
            "code": "authorization",
        }))
    }

    async fn insert_with_flags(
        &self,
        request: RegisterUserRequest,
        flags: UserFlags,
    ) -> Result<User, Error> {
        let RegisterUserRequest {
            email,
            password,
            name,
        } = request;
        let password_hash = self
            .hasher
            .hash(password.expose())
            .await
            .map_err(Self::map_hasher_error)?;
        let new_user = NewUser {
            email,
            name,
            password_hash,
            flags,
        };
        let user = self
            .users
            .insert(&new_user)
            .await
            .map_err(Self::map_user_error)?;
        info!(user_id = %user.id(), superuser = flags.is_superuser, "user created");
        Ok(user)
    }
}

#[async_trait]
impl<U, T, H> UserAccounts for UserAccountService<U, T, H>
where
    U: UserRepository,
    T: AuthTokenRepository,
    H: PasswordHasher,
{
    async fn register(&self, request: RegisterUserRequest) -> Result<User, Error> {
        self.insert_with_flags(request, UserFlags::REGULAR).await
    }

    async fn create_superuser(&self, request: RegisterUserRequest) -> Result<User, Error> {
        self.insert_with_flags(request, UserFlags::SUPERUSER).await
    }

    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let Some(stored) = self
            .users
            .find_credentials(credentials.email())
            .await
            .map_err(Self::map_user_error)?
        else {
            debug!("authentication failed: unknown email");
            return Err(Self::bad_credentials());
        };
        let matches = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .await
            .map_err(Self::map_hasher_error)?;
        if !matches || !stored.user.is_active() {
            debug!(user_id = %stored.user.id(), "authentication failed");
            return Err(Self::bad_credentials());
        }
        Ok(stored.user)
    }

    async fn issue_token(&self, credentials: &LoginCredentials) -> Result<AuthToken, Error> {
        let user = self.authenticate(credentials).await?;
        let token = AuthToken::generate();
        self.tokens
            .replace_for_user(user.id(), &token.digest())
            .await
            .map_err(Self::map_token_error)?;
        info!(user_id = %user.id(), "api token issued");
        Ok(token)
    }

    async fn resolve_token(&self, token: &AuthToken) -> Result<User, Error> {
        let user = self
            .tokens
            .find_user_by_digest(&token.digest())
            .await
            .map_err(Self::map_token_error)?
            .ok_or_else(|| Error::unauthorized("Invalid token."))?;
        if !user.is_active() {
            return Err(Error::unauthorized("User inactive or deleted."));
        }
        Ok(user)
    }

    async fn profile(&self, user_id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> Result<User, Error> {
        let ProfileUpdate {
            email,
            name,
            password,
        } = update;
        let password_hash = match password {
            Some(password) => Some(
                self.hasher
                    .hash(password.expose())
                    .await
                    .map_err(Self::map_hasher_error)?,
            ),
            None => None,
        };
        let changes = UserChanges {
            email,
            name,
            password_hash,
        };
        if changes.is_empty() {
            return self.profile(user_id).await;
        }
        self.users
            .update(user_id, &changes)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[cfg(test)]
#[path = "user_account_service_tests.rs"]
mod tests;
