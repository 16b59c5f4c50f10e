use crate::services::error_response;
use crate::sync::coordinator::SyncService;
use actix_web::{web, HttpResponse, Responder};

pub(crate) async fn process(service: web::Data<SyncService>) -> impl Responder {
    match service.tables().ping().await {
        Ok(()) => HttpResponse::Ok().body("Database connection is active."),
        Err(e) => error_response(&e),
    }
}
