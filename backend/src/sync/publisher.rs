use crate::clients::google::{a1_range, sheet_range};
use crate::clients::{SpreadsheetStore, COLLABORATOR_ROLE};
use crate::error::{Result, SyncError};
use crate::sync::tracker::RevisionTracker;
use common::model::payload::TablePayload;
use common::model::sheet::SheetInfo;
use log::{info, warn};
use std::sync::Arc;

/// Where a payload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRef {
    pub spreadsheet_id: String,
    pub created: bool,
}

/// Pushes payloads to the tracked spreadsheet, creating it on first use.
pub struct SpreadsheetPublisher {
    store: Arc<dyn SpreadsheetStore>,
    tracker: Arc<RevisionTracker>,
    title: String,
    collaborator: Option<String>,
}

impl SpreadsheetPublisher {
    pub fn new(
        store: Arc<dyn SpreadsheetStore>,
        tracker: Arc<RevisionTracker>,
        title: String,
        collaborator: Option<String>,
    ) -> Self {
        Self {
            store,
            tracker,
            title,
            collaborator,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Creates the spreadsheet if none is tracked, otherwise replaces its whole
    /// content: the sheet is cleared, then the header and every data row are
    /// written from `A1`. Nothing of the previous payload survives.
    pub async fn publish(&self, payload: &TablePayload) -> Result<ExternalRef> {
        let values = payload.sheet_values();

        if let Some(id) = self.tracker.spreadsheet_id().await? {
            self.store.clear_range(&id, &sheet_range(&self.title)).await?;
            let range = a1_range(&self.title, "A1");
            self.store.overwrite_range(&id, &range, &values).await?;
            info!("overwrote {} with {} rows", id, payload.rows.len());
            return Ok(ExternalRef {
                spreadsheet_id: id,
                created: false,
            });
        }

        let id = self.store.create(&self.title, &values).await?;
        self.tracker.track(&id).await?;
        info!("created spreadsheet {} with {} rows", id, payload.rows.len());

        match &self.collaborator {
            Some(principal) => {
                self.store
                    .grant_access(&id, principal, COLLABORATOR_ROLE)
                    .await?;
                info!("granted {} access on {} to {}", COLLABORATOR_ROLE, id, principal);
            }
            None => warn!(
                "no collaborator configured, {} is only visible to the service account",
                id
            ),
        }

        Ok(ExternalRef {
            spreadsheet_id: id,
            created: true,
        })
    }

    /// Metadata and revision history of the tracked spreadsheet.
    pub async fn describe(&self) -> Result<SheetInfo> {
        let id = self
            .tracker
            .spreadsheet_id()
            .await?
            .ok_or(SyncError::MissingExternalId)?;
        let metadata = self.store.get_metadata(&id).await?;
        let revisions = self.tracker.revisions().await?;
        Ok(SheetInfo {
            spreadsheet_id: id,
            spreadsheet_name: metadata.title,
            revisions,
        })
    }

    /// Deletes the tracked spreadsheet and forgets it locally.
    pub async fn unpublish(&self) -> Result<String> {
        let id = self
            .tracker
            .spreadsheet_id()
            .await?
            .ok_or(SyncError::MissingExternalId)?;
        self.store.delete(&id).await?;
        self.tracker.teardown().await?;
        info!("deleted spreadsheet {}", id);
        Ok(id)
    }
}
