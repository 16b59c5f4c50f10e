//! Sheet ↔ table synchronization.
//!
//! - `transform`: pure shape conversions.
//! - `tracker`: the revision watermark of the tracked spreadsheet.
//! - `publisher`: pushes payloads to the spreadsheet service.
//! - `materializer`: replaces the relational table.
//! - `coordinator`: the one entry point that runs all of the above under a
//!   single-flight guard.
//! - `poll`: the background timer driving the coordinator.

pub mod coordinator;
pub mod materializer;
pub mod poll;
pub mod publisher;
pub mod tracker;
pub mod transform;

/// Deployment-level settings of the sync components.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub table_name: String,
    pub sheet_title: String,
    pub collaborator: Option<String>,
}
