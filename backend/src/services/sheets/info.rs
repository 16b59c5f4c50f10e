use crate::services::error_response;
use crate::sync::coordinator::SyncService;
use actix_web::{web, HttpResponse, Responder};

pub(crate) async fn process(service: web::Data<SyncService>) -> impl Responder {
    match service.describe().await {
        Ok(info) => HttpResponse::Ok().json(info),
        Err(e) => error_response(&e),
    }
}
