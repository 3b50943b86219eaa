//! Driving port shared by the tag and location endpoints.

use async_trait::async_trait;

use crate::domain::{Error, OwnedAttribute, UserId};

/// List and create use-cases for one kind of owned attribute.
#[async_trait]
pub trait AttributeCatalog<A: OwnedAttribute>: Send + Sync {
    /// Attributes owned by `owner`, ordered by name descending.
    async fn list(&self, owner: UserId) -> Result<Vec<A>, Error>;

    /// Create an attribute bound to `owner`.
    async fn create(&self, owner: UserId, draft: A::Draft) -> Result<A, Error>;
}
