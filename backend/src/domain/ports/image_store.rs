//! Port for storing uploaded image files.

use async_trait::async_trait;

use crate::domain::ImagePath;

use super::define_port_error;

define_port_error! {
    /// Errors raised by image stores.
    pub enum ImageStoreError {
        /// Writing or removing the file failed.
        Io { message: String } => "image store failed: {message}",
    }
}

/// File storage for experience images, addressed by media-relative paths.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Write `bytes` at `path`, creating parent directories as needed.
    async fn save(&self, path: &ImagePath, bytes: &[u8]) -> Result<(), ImageStoreError>;

    /// Remove the file at `path`. Missing files are not an error.
    async fn remove(&self, path: &ImagePath) -> Result<(), ImageStoreError>;
}
