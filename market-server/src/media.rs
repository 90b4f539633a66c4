//! Media store
//!
//! Opaque byte blobs on the local filesystem. Callers hand in image bytes
//! and keep only the returned path; nothing downstream interprets the
//! content.

use std::path::{Path, PathBuf};

use crate::core::error::{MarketError, MarketResult};

#[derive(Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist `bytes` under a fresh name and return the stored path.
    pub async fn store(&self, bytes: &[u8]) -> MarketResult<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MarketError::Database(format!("media dir unavailable: {e}")))?;

        let file_name = format!("{}.jpg", uuid::Uuid::new_v4());
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| MarketError::Database(format!("media write failed: {e}")))?;

        Ok(path.to_string_lossy().into_owned())
    }

    /// Remove a stored file. A failure is logged, not surfaced; the row
    /// deletion it accompanies has already happened.
    pub async fn delete(&self, path: &str) {
        if path.is_empty() || !Path::new(path).starts_with(&self.dir) {
            tracing::warn!(path = %path, "Refusing to delete file outside media dir");
            return;
        }
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path, error = %e, "Failed to delete media file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let path = store.store(b"not really a jpeg").await.unwrap();
        assert!(tokio::fs::try_exists(&path).await.unwrap());

        store.delete(&path).await;
        assert!(!tokio::fs::try_exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn delete_outside_media_dir_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let victim = tempfile::NamedTempFile::new().unwrap();
        let store = MediaStore::new(dir.path().join("uploads"));

        store.delete(victim.path().to_str().unwrap()).await;
        assert!(victim.path().exists());
    }
}
