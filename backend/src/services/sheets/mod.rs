//! # Spreadsheet Service Module
//!
//! Routes acting on the one spreadsheet this backend tracks (its id lives in
//! `sheet_id.json`).
//!
//! ## Sub-modules:
//! - `publish`: pushes the cached payload of the last upload again.
//! - `info`: title, id and revision history.
//! - `remove`: deletes the spreadsheet and forgets it locally.

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

mod info;
mod publish;
mod remove;

const API_PATH: &str = "/api/sheets";

/// Configures and returns the Actix `Scope` for the spreadsheet routes.
///
/// # Registered Routes:
///
/// *   **`POST /publish`**:
///     - **Handler**: `publish::process`
///     - **Description**: Rebuilds the payload from `sheets.json` and publishes it,
///       creating the spreadsheet if none is tracked. Answers a `PublishReport`.
///
/// *   **`GET /info`**:
///     - **Handler**: `info::process`
///     - **Description**: Answers a `SheetInfo`, or `404` when nothing is tracked.
///
/// *   **`DELETE /`**:
///     - **Handler**: `remove::process`
///     - **Description**: Deletes the remote spreadsheet, then clears the tracked id
///       and the revision watermark.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/publish", post().to(publish::process))
        .route("/info", get().to(info::process))
        .route("", delete().to(remove::process))
}

#[cfg(test)]
mod tests {
    use super::configure_routes;
    use crate::sync::coordinator::harness::harness;
    use actix_web::{test, web, App};
    use common::api::PublishReport;
    use common::model::document::SourceDocument;
    use common::model::revision::RevisionState;
    use common::model::sheet::SheetInfo;
    use serde_json::json;

    fn document() -> SourceDocument {
        serde_json::from_value(json!({"Name": ["a"], "Value": ["1"]})).unwrap()
    }

    #[actix_web::test]
    async fn lifecycle_without_and_with_a_sheet() {
        let h = harness(RevisionState::default());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(h.service.clone()))
                .service(configure_routes()),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/sheets/info").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);

        h.service.ingest(&document()).await.unwrap();

        let req = test::TestRequest::post().uri("/api/sheets/publish").to_request();
        let report: PublishReport = test::call_and_read_body_json(&app, req).await;
        assert!(!report.created);

        let req = test::TestRequest::get().uri("/api/sheets/info").to_request();
        let info: SheetInfo = test::call_and_read_body_json(&app, req).await;
        assert_eq!(info.spreadsheet_id, report.spreadsheet_id);

        let req = test::TestRequest::delete().uri("/api/sheets").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
        assert_eq!(h.revisions.snapshot(), RevisionState::default());
    }

    #[actix_web::test]
    async fn publish_without_a_prior_upload_fails() {
        let h = harness(RevisionState::default());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(h.service.clone()))
                .service(configure_routes()),
        )
        .await;
        let req = test::TestRequest::post().uri("/api/sheets/publish").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 500);
    }
}
