//! Port for password hashing.
//!
//! Hashing is deliberately slow, so adapters must not run it on the async
//! executor.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashers.
    pub enum PasswordHasherError {
        /// Hashing failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// The stored hash could not be parsed.
        MalformedHash { message: String } => "stored password hash is malformed: {message}",
    }
}

/// One-way password hashing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing encoded string.
    async fn hash(&self, password: &str) -> Result<String, PasswordHasherError>;

    /// Check a plaintext password against an encoded hash.
    async fn verify(&self, password: &str, encoded: &str) -> Result<bool, PasswordHasherError>;
}
