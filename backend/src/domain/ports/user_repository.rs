//! Port for user account persistence.

use async_trait::async_trait;

use crate::domain::{Email, NewUser, User, UserChanges, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "a user with email {email} already exists",
    }
}

/// A user together with the stored password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    /// The account.
    pub user: User,
    /// Encoded password hash.
    pub password_hash: String,
}

/// Persistence of user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account and return it with its assigned id.
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    /// Fetch an account by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch an account and its password hash by normalised email.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Apply changes to an account. Returns `None` when it does not exist.
    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserRepositoryError>;
}
