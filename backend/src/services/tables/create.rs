use crate::services::error_response;
use crate::sync::coordinator::SyncService;
use actix_web::{web, HttpResponse, Responder};
use log::error;

pub(crate) async fn process(service: web::Data<SyncService>) -> impl Responder {
    match service.rematerialize().await {
        Ok(rows) => HttpResponse::Ok().body(format!(
            "Table {} created with {} rows.",
            service.tables().table(),
            rows
        )),
        Err(e) => {
            error!("could not create table: {}", e);
            error_response(&e)
        }
    }
}
