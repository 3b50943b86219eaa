//! Driving port for the experience endpoints.

use async_trait::async_trait;

use crate::domain::{
    Error, Experience, ExperienceDraft, ExperienceFilter, ExperienceId, ExperiencePatch,
    ImageUpload, UserId,
};

/// Experience use-cases, all scoped to the requesting owner.
#[async_trait]
pub trait ExperienceCatalog: Send + Sync {
    /// Experiences matching `filter`, newest first.
    async fn list(&self, owner: UserId, filter: ExperienceFilter) -> Result<Vec<Experience>, Error>;

    /// One experience; not found when owned by someone else.
    async fn retrieve(&self, owner: UserId, id: ExperienceId) -> Result<Experience, Error>;

    /// Create an experience.
    async fn create(&self, owner: UserId, draft: ExperienceDraft) -> Result<Experience, Error>;

    /// Replace every writable field. Omitted tags clear the set.
    async fn update(
        &self,
        owner: UserId,
        id: ExperienceId,
        draft: ExperienceDraft,
    ) -> Result<Experience, Error>;

    /// Change only the supplied fields.
    async fn partial_update(
        &self,
        owner: UserId,
        id: ExperienceId,
        patch: ExperiencePatch,
    ) -> Result<Experience, Error>;

    /// Delete an experience.
    async fn destroy(&self, owner: UserId, id: ExperienceId) -> Result<(), Error>;

    /// Store an image and attach it to the experience.
    async fn upload_image(
        &self,
        owner: UserId,
        id: ExperienceId,
        upload: ImageUpload,
    ) -> Result<Experience, Error>;
}
