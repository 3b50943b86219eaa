//! Tag and location catalogue.
//!
//! One generic service serves both attribute kinds; the HTTP layer
//! instantiates it once per kind.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{AttributeCatalog, AttributeRepositoryError, OwnedAttributeRepository};
use crate::domain::{Error, OwnedAttribute, UserId};

/// Attribute service implementing [`AttributeCatalog`].
pub struct AttributeCatalogService<A, R> {
    repository: Arc<R>,
    kind: PhantomData<fn() -> A>,
}

impl<A, R> AttributeCatalogService<A, R> {
    /// Create a service over `repository`.
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            kind: PhantomData,
        }
    }
}

impl<A, R> Clone for AttributeCatalogService<A, R> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.repository))
    }
}

fn map_repository_error<A: OwnedAttribute>(error: AttributeRepositoryError) -> Error {
    match error {
        AttributeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("{} repository unavailable: {message}", A::KIND))
        }
        AttributeRepositoryError::Query { message } => {
            Error::internal(format!("{} repository error: {message}", A::KIND))
        }
    }
}

#[async_trait]
impl<A, R> AttributeCatalog<A> for AttributeCatalogService<A, R>
where
    A: OwnedAttribute,
    R: OwnedAttributeRepository<A>,
{
    async fn list(&self, owner: UserId) -> Result<Vec<A>, Error> {
        self.repository
            .list_for_owner(owner)
            .await
            .map_err(map_repository_error::<A>)
    }

    async fn create(&self, owner: UserId, draft: A::Draft) -> Result<A, Error> {
        let created = self
            .repository
            .insert(owner, &draft)
            .await
            .map_err(map_repository_error::<A>)?;
        debug!(kind = A::KIND, %owner, "attribute created");
        Ok(created)
    }
}
