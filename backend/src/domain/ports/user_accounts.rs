//! Driving port for account management and token authentication.

use async_trait::async_trait;

use crate::domain::{AuthToken, Email, Error, LoginCredentials, Password, User, UserId, UserName};

/// Input for self-registration and superuser creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserRequest {
    /// Normalised email.
    pub email: Email,
    /// Chosen password.
    pub password: Password,
    /// Display name, possibly empty.
    pub name: UserName,
}

/// Changes a user makes to their own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New email.
    pub email: Option<Email>,
    /// New display name.
    pub name: Option<UserName>,
    /// New password, hashed before storage.
    pub password: Option<Password>,
}

/// Account use-cases called by inbound adapters.
#[async_trait]
pub trait UserAccounts: Send + Sync {
    /// Create an active, unprivileged account.
    async fn register(&self, request: RegisterUserRequest) -> Result<User, Error>;

    /// Create an account with staff and superuser flags set.
    async fn create_superuser(&self, request: RegisterUserRequest) -> Result<User, Error>;

    /// Verify credentials of an active account.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Authenticate and mint a fresh token, replacing the previous one.
    async fn issue_token(&self, credentials: &LoginCredentials) -> Result<AuthToken, Error>;

    /// Resolve a presented token to its active owner.
    async fn resolve_token(&self, token: &AuthToken) -> Result<User, Error>;

    /// Load the profile of an authenticated user.
    async fn profile(&self, user_id: UserId) -> Result<User, Error>;

    /// Update the profile of an authenticated user.
    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> Result<User, Error>;
}
