use crate::clients::{RelationalStore, RevisionSource, SpreadsheetStore};
use crate::error::Result;
use crate::state::cache::PayloadCache;
use crate::state::revision_store::RevisionStore;
use crate::sync::materializer::TableMaterializer;
use crate::sync::publisher::{ExternalRef, SpreadsheetPublisher};
use crate::sync::tracker::{RevisionCheck, RevisionTracker};
use crate::sync::transform;
use crate::sync::SyncOptions;
use common::api::IngestReport;
use common::model::document::SourceDocument;
use common::model::payload::TablePayload;
use common::model::sheet::SheetInfo;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another sync held the guard; nothing was checked.
    Skipped,
    NoChange,
    Synced { revision: String, rows: usize },
}

/// Single entry point for every path that writes to the spreadsheet, the
/// table or the revision state.
///
/// Upload, manual and timer-driven syncs all take `guard` first, so a
/// check-then-sync can never interleave with a publish. Request paths wait
/// for the guard; timer ticks skip when it is taken.
pub struct SyncService {
    guard: Mutex<()>,
    tracker: Arc<RevisionTracker>,
    publisher: SpreadsheetPublisher,
    materializer: TableMaterializer,
    sheets: Arc<dyn SpreadsheetStore>,
    cache: PayloadCache,
}

impl SyncService {
    pub fn new(
        revisions: Arc<dyn RevisionStore>,
        source: Arc<dyn RevisionSource>,
        sheets: Arc<dyn SpreadsheetStore>,
        tables: Arc<dyn RelationalStore>,
        cache: PayloadCache,
        options: SyncOptions,
    ) -> Self {
        let tracker = Arc::new(RevisionTracker::new(revisions, source));
        let publisher = SpreadsheetPublisher::new(
            sheets.clone(),
            tracker.clone(),
            options.sheet_title,
            options.collaborator,
        );
        Self {
            guard: Mutex::new(()),
            tracker,
            publisher,
            materializer: TableMaterializer::new(tables, options.table_name),
            sheets,
            cache,
        }
    }

    pub fn tracker(&self) -> &RevisionTracker {
        &self.tracker
    }

    pub fn tables(&self) -> &TableMaterializer {
        &self.materializer
    }

    /// Upload path: transform, publish to the spreadsheet, materialize the table.
    ///
    /// A payload the table would refuse is rejected before the spreadsheet,
    /// the caches or the table are written.
    pub async fn ingest(&self, document: &SourceDocument) -> Result<IngestReport> {
        let payload = transform::transform(document)?;
        self.materializer.validate(&payload)?;
        let _guard = self.guard.lock().await;

        self.refresh_cache(&payload).await;
        let sheet = self.publisher.publish(&payload).await?;
        let rows = self.materializer.materialize(&payload).await?;
        Ok(IngestReport {
            spreadsheet_id: sheet.spreadsheet_id,
            created: sheet.created,
            rows,
        })
    }

    /// Pushes the cached spreadsheet payload again.
    pub async fn republish(&self) -> Result<ExternalRef> {
        let payload = transform::from_sheet_document(&self.cache.load_sheet().await?)?;
        let _guard = self.guard.lock().await;
        self.publisher.publish(&payload).await
    }

    /// Rebuilds the table from the cached SQL payload.
    pub async fn rematerialize(&self) -> Result<usize> {
        let payload = transform::from_sql_document(&self.cache.load_sql().await?)?;
        let _guard = self.guard.lock().await;
        self.materializer.materialize(&payload).await
    }

    pub async fn describe(&self) -> Result<SheetInfo> {
        self.publisher.describe().await
    }

    pub async fn unpublish(&self) -> Result<String> {
        let _guard = self.guard.lock().await;
        self.publisher.unpublish().await
    }

    /// Manual sync: waits for any running sync, then checks and syncs.
    pub async fn sync_now(&self) -> Result<TickOutcome> {
        let _guard = self.guard.lock().await;
        self.check_then_sync().await
    }

    /// Timer sync: returns `Skipped` instead of waiting when a sync is running.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let Ok(_guard) = self.guard.try_lock() else {
            return Ok(TickOutcome::Skipped);
        };
        self.check_then_sync().await
    }

    async fn check_then_sync(&self) -> Result<TickOutcome> {
        debug!("checking for new revisions");
        let (spreadsheet_id, revision) = match self.tracker.check().await? {
            RevisionCheck::Unchanged => return Ok(TickOutcome::NoChange),
            RevisionCheck::Advanced {
                spreadsheet_id,
                revision,
            } => (spreadsheet_id, revision),
        };

        info!(
            "revision {} of {} at {} is new, syncing",
            revision.id, spreadsheet_id, revision.modified_time
        );
        let snapshot = self.sheets.get(&spreadsheet_id).await?;
        let payload = transform::from_snapshot(&snapshot)?;
        let rows = self.materializer.materialize(&payload).await?;
        self.tracker.record_seen(revision.modified_time).await?;
        self.refresh_cache(&payload).await;

        Ok(TickOutcome::Synced {
            revision: revision.id,
            rows,
        })
    }

    /// The caches are advisory, so failing to write them only logs.
    async fn refresh_cache(&self, payload: &TablePayload) {
        let sheet = payload.to_sheet_document(self.publisher.title());
        let sql = payload.to_sql_document(self.materializer.table());
        if let Err(e) = self.cache.store(&sheet, &sql).await {
            warn!("could not refresh payload cache: {}", e);
        }
    }
}
