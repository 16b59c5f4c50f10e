use serde::{Deserialize, Serialize};

/// Lifecycle of a background sync job as reported by `GET /api/sync/status/{job_id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress(u32),
    Completed(String),
    Failed(String),
}
