use crate::services::error_response;
use crate::sync::coordinator::SyncService;
use actix_web::{web, HttpResponse, Responder};
use log::error;

pub(crate) async fn process(service: web::Data<SyncService>) -> impl Responder {
    match service.unpublish().await {
        Ok(id) => HttpResponse::Ok().body(format!("Spreadsheet {} deleted.", id)),
        Err(e) => {
            error!("could not delete spreadsheet: {}", e);
            error_response(&e)
        }
    }
}
