//! Experience catalogue service.
//!
//! Every use-case is scoped to the requesting owner. Reference checks on
//! locations and tags happen in the repository, inside the write transaction,
//! and surface here as field errors.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    ExperienceCatalog, ExperienceRepository, ExperienceRepositoryError, ImageStore,
    ImageStoreError,
};
use crate::domain::{
    Error, Experience, ExperienceDraft, ExperienceFilter, ExperienceId, ExperiencePatch,
    ImagePath, ImageUpload, UserId,
};

/// Experience service implementing [`ExperienceCatalog`].
#[derive(Clone)]
pub struct ExperienceCatalogService<R, S> {
    repository: Arc<R>,
    images: Arc<S>,
}

impl<R, S> ExperienceCatalogService<R, S> {
    /// Create a service over the repository and image store.
    pub fn new(repository: Arc<R>, images: Arc<S>) -> Self {
        Self { repository, images }
    }
}

fn not_found(id: ExperienceId) -> Error {
    debug!(%id, "experience not visible to requester");
    Error::not_found("No experience matches the given query.")
}

fn map_repository_error(error: ExperienceRepositoryError) -> Error {
    match error {
        ExperienceRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("experience repository unavailable: {message}"))
        }
        ExperienceRepositoryError::Query { message } => {
            Error::internal(format!("experience repository error: {message}"))
        }
        ExperienceRepositoryError::UnknownLocation { id } => Error::invalid_field(
            "location",
            "does_not_exist",
            format!("Invalid pk \"{id}\" - object does not exist."),
        ),
        ExperienceRepositoryError::UnknownTags { ids } => {
            let first = ids.first().copied().unwrap_or_default();
            Error::invalid_field(
                "tags",
                "does_not_exist",
                format!("Invalid pk \"{first}\" - object does not exist."),
            )
        }
    }
}

fn map_store_error(error: ImageStoreError) -> Error {
    Error::internal(error.to_string())
}

#[async_trait]
impl<R, S> ExperienceCatalog for ExperienceCatalogService<R, S>
where
    R: ExperienceRepository,
    S: ImageStore,
{
    async fn list(&self, owner: UserId, filter: ExperienceFilter) -> Result<Vec<Experience>, Error> {
        self.repository
            .list(owner, &filter)
            .await
            .map_err(map_repository_error)
    }

    async fn retrieve(&self, owner: UserId, id: ExperienceId) -> Result<Experience, Error> {
        self.repository
            .find(owner, id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, owner: UserId, draft: ExperienceDraft) -> Result<Experience, Error> {
        let experience = self
            .repository
            .insert(owner, &draft)
            .await
            .map_err(map_repository_error)?;
        info!(id = %experience.id(), %owner, "experience created");
        Ok(experience)
    }

    async fn update(
        &self,
        owner: UserId,
        id: ExperienceId,
        draft: ExperienceDraft,
    ) -> Result<Experience, Error> {
        self.partial_update(owner, id, ExperiencePatch::from(draft))
            .await
    }

    async fn partial_update(
        &self,
        owner: UserId,
        id: ExperienceId,
        patch: ExperiencePatch,
    ) -> Result<Experience, Error> {
        self.repository
            .update(owner, id, &patch)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| not_found(id))
    }

    async fn destroy(&self, owner: UserId, id: ExperienceId) -> Result<(), Error> {
        let removed = self
            .repository
            .delete(owner, id)
            .await
            .map_err(map_repository_error)?;
        if !removed {
            return Err(not_found(id));
        }
        info!(%id, %owner, "experience deleted");
        Ok(())
    }

    async fn upload_image(
        &self,
        owner: UserId,
        id: ExperienceId,
        upload: ImageUpload,
    ) -> Result<Experience, Error> {
        self.retrieve(owner, id).await?;
        let path = upload.target_path();
        self.images
            .save(&path, upload.bytes())
            .await
            .map_err(map_store_error)?;
        let updated = self
            .repository
            .set_image(owner, id, &path)
            .await
            .map_err(map_repository_error);
        match updated {
            Ok(Some(experience)) => {
                info!(%id, path = path.as_ref(), "experience image stored");
                Ok(experience)
            }
            Ok(None) => {
                self.discard(&path).await;
                Err(not_found(id))
            }
            Err(err) => {
                self.discard(&path).await;
                Err(err)
            }
        }
    }
}

impl<R, S> ExperienceCatalogService<R, S>
where
    S: ImageStore,
{
    async fn discard(&self, path: &ImagePath) {
        if let Err(err) = self.images.remove(path).await {
            warn!(error = %err, path = path.as_ref(), "failed to remove orphaned image");
        }
    }
}

#[cfg(test)]
#[path = "experience_catalog_service_tests.rs"]
mod tests;
