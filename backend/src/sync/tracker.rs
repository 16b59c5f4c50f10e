use crate::clients::RevisionSource;
use crate::error::{Result, SyncError};
use crate::state::revision_store::RevisionStore;
use chrono::{DateTime, Utc};
use common::model::revision::{Revision, RevisionState};
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of comparing the remote history with the stored watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionCheck {
    Unchanged,
    Advanced {
        spreadsheet_id: String,
        revision: Revision,
    },
}

/// The most recent revision by modification time. Among equal timestamps the
/// one listed first wins.
pub fn latest_revision(revisions: &[Revision]) -> Option<&Revision> {
    revisions.iter().fold(None, |best: Option<&Revision>, candidate| match best {
        Some(current) if candidate.modified_time <= current.modified_time => Some(current),
        _ => Some(candidate),
    })
}

/// Tracks which spreadsheet is synchronized and the last revision already
/// pulled from it.
pub struct RevisionTracker {
    store: Arc<dyn RevisionStore>,
    source: Arc<dyn RevisionSource>,
    /// Serializes the load-modify-save cycles on the record.
    write_lock: Mutex<()>,
}

impl RevisionTracker {
    pub fn new(store: Arc<dyn RevisionStore>, source: Arc<dyn RevisionSource>) -> Self {
        Self {
            store,
            source,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn spreadsheet_id(&self) -> Result<Option<String>> {
        Ok(self.store.load().await?.spreadsheet_id)
    }

    async fn require_id(&self) -> Result<(String, RevisionState)> {
        let state = self.store.load().await?;
        match state.spreadsheet_id.clone() {
            Some(id) => Ok((id, state)),
            None => Err(SyncError::MissingExternalId),
        }
    }

    /// Lists the remote history of the tracked spreadsheet.
    pub async fn revisions(&self) -> Result<Vec<Revision>> {
        let (id, _) = self.require_id().await?;
        self.source.list_revisions(&id).await
    }

    pub async fn check(&self) -> Result<RevisionCheck> {
        let (id, state) = self.require_id().await?;
        let revisions = self.source.list_revisions(&id).await?;
        let Some(latest) = latest_revision(&revisions) else {
            debug!("spreadsheet {} has no revisions yet", id);
            return Ok(RevisionCheck::Unchanged);
        };

        let advanced = match state.latest_modified_time {
            Some(watermark) => latest.modified_time > watermark,
            None => true,
        };
        if advanced {
            Ok(RevisionCheck::Advanced {
                spreadsheet_id: id,
                revision: latest.clone(),
            })
        } else {
            Ok(RevisionCheck::Unchanged)
        }
    }

    pub async fn has_advanced(&self) -> Result<bool> {
        Ok(matches!(self.check().await?, RevisionCheck::Advanced { .. }))
    }

    /// Moves the watermark to `timestamp` unless that would move it backward.
    /// Returns whether the watermark changed.
    pub async fn record_seen(&self, timestamp: DateTime<Utc>) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.store.load().await?;
        if let Some(current) = state.latest_modified_time {
            if timestamp < current {
                debug!("ignoring stale revision time {} (watermark {})", timestamp, current);
                return Ok(false);
            }
            if timestamp == current {
                return Ok(false);
            }
        }
        state.latest_modified_time = Some(timestamp);
        self.store.save(&state).await?;
        Ok(true)
    }

    /// Seeds a missing watermark from the newest remote revision, so a fresh
    /// process does not treat the whole history as new. Does nothing when no
    /// spreadsheet is tracked or a watermark already exists.
    pub async fn ensure_initialized(&self) -> Result<()> {
        let state = self.store.load().await?;
        let Some(id) = state.spreadsheet_id else {
            debug!("no spreadsheet tracked yet, nothing to initialize");
            return Ok(());
        };
        if let Some(watermark) = state.latest_modified_time {
            debug!("watermark already set to {}", watermark);
            return Ok(());
        }

        let revisions = self.source.list_revisions(&id).await?;
        match latest_revision(&revisions) {
            Some(latest) => {
                self.record_seen(latest.modified_time).await?;
                info!("initialized watermark of {} to {}", id, latest.modified_time);
            }
            None => info!("spreadsheet {} has no revisions, watermark left empty", id),
        }
        Ok(())
    }

    /// Starts tracking `spreadsheet_id`. Re-tracking the same id is a no-op; a
    /// different id is refused while one is tracked.
    pub async fn track(&self, spreadsheet_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut state = self.store.load().await?;
        match state.spreadsheet_id.as_deref() {
            Some(current) if current == spreadsheet_id => Ok(()),
            Some(current) => Err(SyncError::ExternalIdConflict {
                tracked: current.to_string(),
                requested: spreadsheet_id.to_string(),
            }),
            None => {
                state.spreadsheet_id = Some(spreadsheet_id.to_string());
                self.store.save(&state).await
            }
        }
    }

    /// Forgets the tracked spreadsheet and its watermark.
    pub async fn teardown(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.clear().await
    }
}
