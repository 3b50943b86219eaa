//! Port for API token persistence.
//!
//! Adapters only ever see token digests.

use async_trait::async_trait;

use crate::domain::{TokenDigest, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token repository adapters.
    pub enum AuthTokenRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "token repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "token repository query failed: {message}",
    }
}

/// Storage of the single active token of each user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthTokenRepository: Send + Sync {
    /// Store `digest` as the user's token, replacing any previous one.
    async fn replace_for_user(
        &self,
        user_id: UserId,
        digest: &TokenDigest,
    ) -> Result<(), AuthTokenRepositoryError>;

    /// Find the owner of a token digest.
    async fn find_user_by_digest(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<User>, AuthTokenRepositoryError>;
}
