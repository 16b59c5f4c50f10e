//! # Table Service Module
//!
//! Routes over the SQLite database the spreadsheet content is materialized into.
//! Table names taken from the path must be plain SQL identifiers.
//!
//! ## Sub-modules:
//! - `check`: database liveness.
//! - `create`: rebuilds the configured table from `sql.json`.
//! - `fetch`: every row of a table as JSON objects.
//! - `remove`: drops a table.

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

mod check;
mod create;
mod fetch;
mod remove;

const API_PATH: &str = "/api/tables";

/// Configures and returns the Actix `Scope` for the table routes.
///
/// # Registered Routes:
///
/// *   **`GET /check`**: `check::process`, plain-text confirmation or `500`.
/// *   **`POST /create`**: `create::process`, rebuilds the configured table.
/// *   **`GET /{name}`**: `fetch::process`, rows as a JSON array, `400` for an
///     invalid name.
/// *   **`DELETE /{name}`**: `remove::process`, drops the table if it exists.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Registered before `/{name}` so it is not taken for a table name.
        .route("/check", get().to(check::process))
        .route("/create", post().to(create::process))
        .route("/{name}", get().to(fetch::process))
        .route("/{name}", delete().to(remove::process))
}
