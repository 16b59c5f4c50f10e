//! # File Upload Service Module
//!
//! Entry point for new data. A client uploads one column-oriented JSON
//! document such as `{"Name": ["a", "b"], "Value": ["1", "2"]}`; the backend
//! turns it into rows, pushes them to the tracked spreadsheet (created on first
//! use) and rebuilds the relational table from them.
//!
//! ## Sub-modules:
//! - `upload`: multipart handling, spooling to a temporary file and the call
//!   into `SyncService::ingest`.

use actix_web::web::{post, scope};
use actix_web::Scope;

mod upload;

const API_PATH: &str = "/api/files";

/// Configures and returns the Actix `Scope` for the upload route.
///
/// # Registered Routes:
///
/// *   **`POST /upload`**:
///     - **Handler**: `upload::process`
///     - **Description**: Expects `multipart/form-data` with a `file` field whose
///       name ends in `.json`. Answers `200 OK` with an `IngestReport`, `400` when
///       the document is malformed, `500` when the table schema refuses it (e.g. a
///       column named `id`), `502` when the spreadsheet service fails.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/upload", post().to(upload::process))
}
