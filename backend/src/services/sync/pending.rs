use crate::services::error_response;
use crate::sync::coordinator::SyncService;
use actix_web::{web, HttpResponse, Responder};

pub(crate) async fn process(service: web::Data<SyncService>) -> impl Responder {
    match service.tracker().has_advanced().await {
        Ok(advanced) => HttpResponse::Ok().json(serde_json::json!({ "advanced": advanced })),
        Err(e) => error_response(&e),
    }
}
