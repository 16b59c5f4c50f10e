//! `POST /api/sync/start`.
//!
//! The job is registered as `Pending` and its id returned immediately. A
//! spawned task moves it to `InProgress(0)`, waits for the sync guard, runs
//! one cycle and reports `Completed` with a summary or `Failed` with the error.

use crate::job_controller::state::{JobUpdate, JobsState};
use crate::sync::coordinator::{SyncService, TickOutcome};
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use log::{error, info};
use std::sync::Arc;

/// Actix web handler for `POST /api/sync/start`.
///
/// # Arguments
/// * `state` - The shared `JobsState` the job is registered in.
/// * `service` - The shared `SyncService` that runs the cycle.
///
/// # Returns
/// `200 OK` with `{"job_id": ...}`. The outcome is read later through
/// `GET /api/sync/status/{job_id}`.
pub(crate) async fn process(
    state: web::Data<JobsState>,
    service: web::Data<SyncService>,
) -> impl Responder {
    let job_id = schedule_sync_job(&state, service.into_inner()).await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}

fn summarize(outcome: TickOutcome) -> String {
    match outcome {
        TickOutcome::Synced { revision, rows } => {
            format!("Synced revision {} ({} rows)", revision, rows)
        }
        TickOutcome::NoChange => "No new revisions".to_string(),
        TickOutcome::Skipped => "Another sync was running".to_string(),
    }
}

async fn schedule_sync_job(state: &JobsState, service: Arc<SyncService>) -> String {
    let job_id = state.register().await;
    let tx = state.tx.clone();
    let job = job_id.clone();

    tokio::spawn(async move {
        let _ = tx
            .send(JobUpdate {
                job_id: job.clone(),
                status: JobStatus::InProgress(0),
            })
            .await;

        let status = match service.sync_now().await {
            Ok(outcome) => {
                let summary = summarize(outcome);
                info!("sync job {}: {}", job, summary);
                JobStatus::Completed(summary)
            }
            Err(e) => {
                error!("sync job {} failed: {}", job, e);
                JobStatus::Failed(e.to_string())
            }
        };
        let _ = tx.send(JobUpdate { job_id: job, status }).await;
    });

    job_id
}
