use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::error::StorageError;

/// Uploaded videos, one file per id
#[derive(Debug, Clone)]
pub struct VideoStore {
    dir: PathBuf,
}

impl VideoStore {
    /// Open the store, creating its directory if needed
    pub async fn init(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))?;

        info!("Video store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an upload and return its new id
    pub async fn save(&self, bytes: &[u8]) -> Result<String, StorageError> {
        let id = Uuid::new_v4().to_string();
        let path = self.path_for(&id)?;

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::io(&path, e))?;

        info!("Stored video {} ({} bytes)", id, bytes.len());
        Ok(id)
    }

    pub async fn load(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(id)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    pub async fn exists(&self, id: &str) -> bool {
        match self.path_for(id) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Ids are UUIDs; anything else never maps to a file
    fn path_for(&self, id: &str) -> Result<PathBuf, StorageError> {
        let uuid = Uuid::parse_str(id).map_err(|_| StorageError::InvalidId(id.to_string()))?;
        Ok(self.dir.join(format!("{}.webm", uuid.hyphenated())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = VideoStore::init(temp.path().join("videos")).await.unwrap();

        let id = store.save(b"webm-bytes").await.unwrap();

        assert!(store.exists(&id).await);
        assert_eq!(store.load(&id).await.unwrap(), b"webm-bytes");
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = VideoStore::init(temp.path()).await.unwrap();

        let err = store.load(&Uuid::new_v4().to_string()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_non_uuid_id_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = VideoStore::init(temp.path()).await.unwrap();

        let err = store.load("../analytics").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidId(_)));
        assert!(!store.exists("../analytics").await);
    }
}
