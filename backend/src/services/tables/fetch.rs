use crate::services::error_response;
use crate::sync::coordinator::SyncService;
use actix_web::{web, HttpResponse, Responder};

/// Actix web handler for `GET /api/tables/{name}`.
///
/// # Arguments
/// * `name` - The table to read, taken from the path.
/// * `service` - The shared `SyncService` holding the relational store.
///
/// # Returns
/// `200 OK` with the rows as a JSON array of objects keyed by column name, the
/// surrogate `id` first. `400` for a name that is not a plain identifier.
pub(crate) async fn process(
    name: web::Path<String>,
    service: web::Data<SyncService>,
) -> impl Responder {
    match service.tables().select_all(&name.into_inner()).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => error_response(&e),
    }
}
