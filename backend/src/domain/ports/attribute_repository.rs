//! Port for tag and location persistence.

use async_trait::async_trait;

use crate::domain::{OwnedAttribute, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by attribute repository adapters.
    pub enum AttributeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "attribute repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "attribute repository query failed: {message}",
    }
}

/// Persistence of one kind of user-owned attribute.
#[async_trait]
pub trait OwnedAttributeRepository<A: OwnedAttribute>: Send + Sync {
    /// All attributes of `owner`, ordered by name descending.
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<A>, AttributeRepositoryError>;

    /// Persist a new attribute bound to `owner`.
    async fn insert(&self, owner: UserId, draft: &A::Draft) -> Result<A, AttributeRepositoryError>;
}
