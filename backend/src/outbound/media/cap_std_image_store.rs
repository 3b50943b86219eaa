//! Filesystem image store rooted at the media directory.
//!
//! All access goes through a capability handle on the media root, so a stored
//! path can never address files outside it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::ImagePath;
use crate::domain::ports::{ImageStore, ImageStoreError};

/// [`ImageStore`] writing below a media root directory.
#[derive(Clone)]
pub struct CapStdImageStore {
    root: Arc<Dir>,
    root_path: PathBuf,
}

impl CapStdImageStore {
    /// Open (creating if needed) the media root.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory cannot be created or opened.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root_path = root.as_ref().to_path_buf();
        Dir::create_ambient_dir_all(&root_path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(&root_path, ambient_authority())?;
        Ok(Self {
            root: Arc::new(dir),
            root_path,
        })
    }

    /// The media root on disk.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    async fn run<F>(&self, path: &ImagePath, op: F) -> Result<(), ImageStoreError>
    where
        F: FnOnce(&Dir, &Path) -> io::Result<()> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        let relative = PathBuf::from(path.as_ref());
        let display = relative.display().to_string();
        tokio::task::spawn_blocking(move || op(&root, &relative))
            .await
            .map_err(|err| ImageStoreError::io(err.to_string()))?
            .map_err(|err| ImageStoreError::io(format!("{display}: {err}")))
    }
}

#[async_trait]
impl ImageStore for CapStdImageStore {
    async fn save(&self, path: &ImagePath, bytes: &[u8]) -> Result<(), ImageStoreError> {
        let contents = bytes.to_vec();
        self.run(path, move |root, relative| {
            if let Some(parent) = relative.parent().filter(|p| !p.as_os_str().is_empty()) {
                root.create_dir_all(parent)?;
            }
            root.write(relative, contents)
        })
        .await?;
        debug!(path = path.as_ref(), size = bytes.len(), "image written");
        Ok(())
    }

    async fn remove(&self, path: &ImagePath) -> Result<(), ImageStoreError> {
        self.run(path, |root, relative| match root.remove_file(relative) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn media() -> (TempDir, CapStdImageStore) {
        let dir = TempDir::new().expect("temp dir");
        let store = CapStdImageStore::open(dir.path().join("media")).expect("open store");
        (dir, store)
    }

    #[rstest]
    #[tokio::test]
    async fn save_creates_parent_directories(media: (TempDir, CapStdImageStore)) {
        let (_guard, store) = media;
        let path = ImagePath::generate("png");
        store.save(&path, b"pixels").await.expect("save");

        let on_disk = store.root_path().join(path.as_ref());
        assert_eq!(std::fs::read(on_disk).expect("read back"), b"pixels");
    }

    #[rstest]
    #[tokio::test]
    async fn remove_is_idempotent(media: (TempDir, CapStdImageStore)) {
        let (_guard, store) = media;
        let path = ImagePath::generate("jpg");
        store.save(&path, b"data").await.expect("save");

        store.remove(&path).await.expect("first remove");
        store.remove(&path).await.expect("second remove");
        assert!(!store.root_path().join(path.as_ref()).exists());
    }

    #[rstest]
    #[tokio::test]
    async fn paths_cannot_escape_the_root(media: (TempDir, CapStdImageStore)) {
        let (_guard, store) = media;
        let escape = ImagePath::from_stored("../outside.png".to_owned());
        let err = store.save(&escape, b"x").await.expect_err("sandboxed");
        assert!(matches!(err, ImageStoreError::Io { .. }));
    }
}
