//! Port for experience persistence.
//!
//! Every operation is scoped to an owner: an experience belonging to someone
//! else behaves exactly like a missing one. Writes check that the referenced
//! location and tags belong to the same owner.

use async_trait::async_trait;

use crate::domain::{
    Experience, ExperienceDraft, ExperienceFilter, ExperienceId, ExperiencePatch, ImagePath,
    UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by experience repository adapters.
    pub enum ExperienceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "experience repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "experience repository query failed: {message}",
        /// The location does not exist for this owner.
        UnknownLocation { id: i64 } => "location {id} does not exist",
        /// Some tags do not exist for this owner.
        UnknownTags { ids: Vec<i64> } => "tags {ids:?} do not exist",
    }
}

/// Owner-scoped persistence of experiences.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExperienceRepository: Send + Sync {
    /// Experiences of `owner` matching `filter`, newest id first.
    async fn list(
        &self,
        owner: UserId,
        filter: &ExperienceFilter,
    ) -> Result<Vec<Experience>, ExperienceRepositoryError>;

    /// One experience of `owner`.
    async fn find(
        &self,
        owner: UserId,
        id: ExperienceId,
    ) -> Result<Option<Experience>, ExperienceRepositoryError>;

    /// Create an experience and its tag links in one transaction.
    async fn insert(
        &self,
        owner: UserId,
        draft: &ExperienceDraft,
    ) -> Result<Experience, ExperienceRepositoryError>;

    /// Apply a patch in one transaction. `Some` tags replace the whole set.
    async fn update(
        &self,
        owner: UserId,
        id: ExperienceId,
        patch: &ExperiencePatch,
    ) -> Result<Option<Experience>, ExperienceRepositoryError>;

    /// Delete an experience. Returns whether a row was removed.
    async fn delete(&self, owner: UserId, id: ExperienceId)
    -> Result<bool, ExperienceRepositoryError>;

    /// Record the stored image path.
    async fn set_image(
        &self,
        owner: UserId,
        id: ExperienceId,
        image: &ImagePath,
    ) -> Result<Option<Experience>, ExperienceRepositoryError>;
}
