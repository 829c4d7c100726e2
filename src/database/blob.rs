use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use url::Url;
use uuid::Uuid;

use crate::database::gateway::{cv_image_path, BlobStore};
use crate::error::{Error, Result};

/// URL prefix the server mounts `upload_dir` under.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Writes blobs under a local directory that the server exposes at `/uploads`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: Url,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Result<Self> {
        let mut public_base = Url::parse(public_base_url)
            .map_err(|e| Error::Config(format!("Invalid PUBLIC_BASE_URL: {}", e)))?;
        if !public_base.path().ends_with('/') {
            let path = format!("{}/", public_base.path());
            public_base.set_path(&path);
        }
        Ok(Self {
            root: root.into(),
            public_base,
        })
    }

    fn public_url(&self, relative: &str) -> Result<String> {
        let joined = self
            .public_base
            .join(&format!("{}/{}", UPLOADS_ROUTE.trim_start_matches('/'), relative))
            .map_err(|e| Error::Internal(format!("Failed to build blob URL: {}", e)))?;
        Ok(joined.to_string())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_cv_image(&self, owner_id: Uuid, cv_id: Uuid, png: Bytes) -> Result<String> {
        let relative = cv_image_path(owner_id, cv_id);
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &png).await?;
        tracing::info!(path = %path.display(), bytes = png.len(), "Stored CV image");
        self.public_url(&relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_to_deterministic_path() {
        let root = std::env::temp_dir().join(format!("cv_blob_test_{}", Uuid::new_v4()));
        let store = LocalBlobStore::new(&root, "https://cv.example.com/base").unwrap();
        let (owner, cv) = (Uuid::new_v4(), Uuid::new_v4());

        let url = store
            .put_cv_image(owner, cv, Bytes::from_static(b"png"))
            .await
            .unwrap();
        assert_eq!(
            url,
            format!("https://cv.example.com/base/uploads/cv-images/{}/{}.png", owner, cv)
        );
        let written = std::fs::read(root.join(cv_image_path(owner, cv))).unwrap();
        assert_eq!(written, b"png");

        // Overwrites in place on a second save.
        store
            .put_cv_image(owner, cv, Bytes::from_static(b"new"))
            .await
            .unwrap();
        let written = std::fs::read(root.join(cv_image_path(owner, cv))).unwrap();
        assert_eq!(written, b"new");

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(LocalBlobStore::new("/tmp", "not a url").is_err());
    }
}
