//! HTTP surface. Each sub-module exposes a `configure_routes()` scope that
//! `main.rs` mounts on the Actix app.

pub mod files;
pub mod sheets;
pub mod sync;
pub mod tables;

use crate::error::SyncError;
use actix_web::HttpResponse;

/// Plain-text error response carrying the status mapped from `err`.
pub(crate) fn error_response(err: &SyncError) -> HttpResponse {
    HttpResponse::build(err.status_code()).body(format!("Error: {}", err))
}
