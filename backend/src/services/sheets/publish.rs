use crate::services::error_response;
use crate::sync::coordinator::SyncService;
use actix_web::{web, HttpResponse, Responder};
use common::api::PublishReport;
use log::error;

pub(crate) async fn process(service: web::Data<SyncService>) -> impl Responder {
    match service.republish().await {
        Ok(sheet) => HttpResponse::Ok().json(PublishReport {
            spreadsheet_id: sheet.spreadsheet_id,
            created: sheet.created,
        }),
        Err(e) => {
            error!("publish failed: {}", e);
            error_response(&e)
        }
    }
}
