//! # Sync Service Module
//!
//! Manual control over the spreadsheet-to-table direction. The background poll
//! loop runs the same cycle on a timer; these routes let a client trigger it and
//! follow it without waiting for the next tick.
//!
//! ## Sub-modules:
//! - `start`: schedules a sync job through the `job_controller`.
//! - `get_status`: reads a job's `JobStatus`.
//! - `pending`: asks the revision tracker whether a sync would pull anything.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod get_status;
mod pending;
mod start;

const API_PATH: &str = "/api/sync";

/// Configures and returns the Actix `Scope` for the sync routes.
///
/// # Registered Routes:
///
/// *   **`POST /start`**:
///     - **Handler**: `start::process`
///     - **Description**: Registers a job, answers `{"job_id": ...}` at once, and
///       runs one check-then-sync cycle in the background once any running sync
///       has finished.
///
/// *   **`GET /status/{job_id}`**:
///     - **Handler**: `get_status::process`
///     - **Description**: Answers the job's `JobStatus`, or `404 Job ID not found`.
///
/// *   **`GET /pending`**:
///     - **Handler**: `pending::process`
///     - **Description**: Answers `{"advanced": bool}`: whether the spreadsheet has
///       a revision newer than the last one synced. Syncs nothing.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/start", post().to(start::process))
        .route("/status/{job_id}", get().to(get_status::process))
        .route("/pending", get().to(pending::process))
}
