use crate::error::Result;
use crate::state::{read_json, write_json_atomic};
use async_trait::async_trait;
use common::model::revision::RevisionState;
use std::io::ErrorKind;
use std::path::PathBuf;

pub const REVISION_FILE: &str = "sheet_id.json";

/// Storage for the single [`RevisionState`] record.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Returns the stored record, or an empty one if nothing was saved yet.
    async fn load(&self) -> Result<RevisionState>;
    async fn save(&self, state: &RevisionState) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Keeps the record in `<state_dir>/sheet_id.json`.
pub struct FileRevisionStore {
    path: PathBuf,
}

impl FileRevisionStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: state_dir.into().join(REVISION_FILE),
        }
    }
}

#[async_trait]
impl RevisionStore for FileRevisionStore {
    async fn load(&self) -> Result<RevisionState> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }

    async fn save(&self, state: &RevisionState) -> Result<()> {
        write_json_atomic(&self.path, state).await
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn missing_file_loads_as_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRevisionStore::new(dir.path());
        assert_eq!(store.load().await.unwrap(), RevisionState::default());
    }

    #[tokio::test]
    async fn saved_state_survives_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let state = RevisionState {
            spreadsheet_id: Some("sheet-1".into()),
            latest_modified_time: Some(Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap()),
        };
        FileRevisionStore::new(dir.path()).save(&state).await.unwrap();

        let reopened = FileRevisionStore::new(dir.path());
        assert_eq!(reopened.load().await.unwrap(), state);
        assert!(dir.path().join(REVISION_FILE).exists());
    }

    #[tokio::test]
    async fn clear_removes_the_record_and_tolerates_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRevisionStore::new(dir.path());
        store
            .save(&RevisionState {
                spreadsheet_id: Some("sheet-1".into()),
                latest_modified_time: None,
            })
            .await
            .unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), RevisionState::default());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_state_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(REVISION_FILE), b"{not json").unwrap();
        let err = FileRevisionStore::new(dir.path()).load().await.unwrap_err();
        assert!(matches!(err, crate::error::SyncError::State(_)));
    }
}
