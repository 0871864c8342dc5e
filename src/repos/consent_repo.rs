/*
 * Responsibility
 * - Persistence of the single consent record of this install
 * - One record under a fixed storage key; cleared wholesale
 */
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::repos::error::RepoError;
use crate::services::consent::ConsentRecord;

/// Fixed key the consent record is stored under.
pub const CONSENT_STORAGE_KEY: &str = "userConsent";

/// Storage seam for the consent gate.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // `Ok(None)` when nothing has been stored yet.
    async fn load(&self) -> Result<Option<ConsentRecord>, RepoError>;

    async fn save(&self, record: &ConsentRecord) -> Result<(), RepoError>;

    // Clearing a store that holds nothing is not an error.
    async fn clear(&self) -> Result<(), RepoError>;
}

/// JSON file at `{dir}/userConsent.json`.
#[derive(Debug, Clone)]
pub struct FileConsentStore {
    path: PathBuf,
}

impl FileConsentStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CONSENT_STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConsentStore for FileConsentStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<Option<ConsentRecord>, RepoError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, record: &ConsentRecord) -> Result<(), RepoError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // write-then-rename so a crash never leaves a half-written record
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), RepoError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryConsentStore {
    slot: Mutex<Option<ConsentRecord>>,
}

impl MemoryConsentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsentStore for MemoryConsentStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<Option<ConsentRecord>, RepoError> {
        Ok(*self.slot.lock().await)
    }

    async fn save(&self, record: &ConsentRecord) -> Result<(), RepoError> {
        *self.slot.lock().await = Some(*record);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RepoError> {
        self.slot.lock().await.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::consent::ConsentSelections;

    fn sample() -> ConsentRecord {
        ConsentRecord::from_selections(ConsentSelections {
            analytics: true,
            marketing: false,
            third_party: true,
        })
    }

    #[tokio::test]
    async fn file_store_round_trips_under_fixed_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConsentStore::new(dir.path().join("nested"));

        assert!(store.load().await.unwrap().is_none());

        store.save(&sample()).await.unwrap();
        assert!(store.path().ends_with("userConsent.json"));
        assert_eq!(store.load().await.unwrap(), Some(sample()));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        // clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn file_store_reports_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConsentStore::new(dir.path());
        tokio::fs::write(store.path(), b"not json").await.unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, RepoError::Malformed(_)));
    }

    #[tokio::test]
    async fn memory_store_clears() {
        let store = MemoryConsentStore::new();
        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(sample()));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
