//! Tracks manual sync jobs started through `POST /api/sync/start`.
//!
//! A manual sync may wait behind a running poll tick or upload, so the
//! request returns a `job_id` right away and the work continues in the
//! background. Workers report progress as `JobUpdate` messages on an MPSC
//! channel; `start_job_updater` is the only writer of the shared map.

use common::jobs::JobStatus;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Finished (`Completed` or `Failed`) jobs kept for status lookups. Older ones
/// are evicted first; pending and running jobs are never evicted.
pub const RETAINED_FINISHED_JOBS: usize = 256;

/// Shared job table, injected into the Actix app as `web::Data`.
#[derive(Clone)]
pub struct JobsState {
    /// Job id to latest status. Read by the status endpoint.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    /// Where background workers send their `JobUpdate`s.
    pub tx: mpsc::Sender<JobUpdate>,
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobsState {
    /// Creates the state together with the receiver `start_job_updater` drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a new job as `Pending` and returns its id.
    pub async fn register(&self) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.jobs
            .write()
            .await
            .insert(job_id.clone(), JobStatus::Pending);
        job_id
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

fn is_finished(status: &JobStatus) -> bool {
    matches!(status, JobStatus::Completed(_) | JobStatus::Failed(_))
}

/// Applies `JobUpdate`s to the shared map until every sender is gone.
pub async fn start_job_updater(state: JobsState, rx: mpsc::Receiver<JobUpdate>) {
    run_job_updater(state, rx, RETAINED_FINISHED_JOBS).await
}

async fn run_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>, retained: usize) {
    let mut finished: VecDeque<String> = VecDeque::new();
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if is_finished(&update.status) && !jobs.get(&update.job_id).is_some_and(is_finished) {
            finished.push_back(update.job_id.clone());
        }
        jobs.insert(update.job_id, update.status);

        while finished.len() > retained {
            if let Some(oldest) = finished.pop_front() {
                jobs.remove(&oldest);
                debug!("evicted finished job {}", oldest);
            }
        }
    }
}
