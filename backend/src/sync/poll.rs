//! The background revision poll.
//!
//! Every tick walks `Idle → Checking → (NoChange | Syncing) → Idle`. Ticks
//! start at fixed offsets no matter how long the previous one took; a tick
//! that lands while a sync is still running is skipped by the coordinator.
//! Errors end the tick, never the loop: the next tick is the retry.

use crate::sync::coordinator::{SyncService, TickOutcome};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Runs one tick and logs its outcome. Never fails.
pub async fn run_tick(service: &SyncService) -> Option<TickOutcome> {
    match service.tick().await {
        Ok(TickOutcome::Skipped) => {
            debug!("previous sync still running, skipping tick");
            Some(TickOutcome::Skipped)
        }
        Ok(TickOutcome::NoChange) => {
            debug!("no new revisions");
            Some(TickOutcome::NoChange)
        }
        Ok(TickOutcome::Synced { revision, rows }) => {
            info!("synced revision {} ({} rows)", revision, rows);
            Some(TickOutcome::Synced { revision, rows })
        }
        Err(e) => {
            error!("sync tick failed: {}", e);
            None
        }
    }
}

/// Seeds the watermark, then ticks every `period` until the process exits.
pub async fn run_poll_loop(service: Arc<SyncService>, period: Duration) {
    if let Err(e) = service.tracker().ensure_initialized().await {
        warn!("could not initialize revision watermark: {}", e);
    }

    info!("polling for spreadsheet revisions every {:?}", period);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    loop {
        ticker.tick().await;
        let service = service.clone();
        tokio::spawn(async move {
            run_tick(&service).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fake::{at, revision};
    use crate::sync::coordinator::harness::{harness, tracked_at};
    use common::model::revision::RevisionState;

    #[tokio::test]
    async fn failing_tick_is_swallowed() {
        let h = harness(RevisionState::default());
        assert_eq!(run_tick(&h.service).await, None);
        assert_eq!(h.tables.writes(), 0);
    }

    #[tokio::test]
    async fn loop_seeds_the_watermark_and_keeps_ticking() {
        let h = harness(RevisionState {
            spreadsheet_id: Some("sheet-1".into()),
            latest_modified_time: None,
        });
        h.sheets.set_revisions(vec![revision("1", at(9, 0))]);

        let handle = tokio::spawn(run_poll_loop(h.service.clone(), Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.abort();

        assert_eq!(h.revisions.snapshot().latest_modified_time, Some(at(9, 0)));
        // Seeding means the existing revision is never treated as an edit.
        assert_eq!(h.tables.writes(), 0);
    }

    #[tokio::test]
    async fn synced_tick_is_reported() {
        let h = harness(tracked_at(at(9, 0)));
        h.sheets.set_revisions(vec![revision("2", at(9, 30))]);
        h.sheets.set_snapshot(&["Name"], &[&["a"]]);
        assert_eq!(
            run_tick(&h.service).await,
            Some(TickOutcome::Synced {
                revision: "2".into(),
                rows: 1
            })
        );
    }
}
