use crate::services::error_response;
use crate::sync::coordinator::SyncService;
use actix_web::{web, HttpResponse, Responder};
use log::error;

pub(crate) async fn process(
    name: web::Path<String>,
    service: web::Data<SyncService>,
) -> impl Responder {
    let name = name.into_inner();
    match service.tables().drop_table(&name).await {
        Ok(()) => HttpResponse::Ok().body(format!("Table {} deleted.", name)),
        Err(e) => {
            error!("could not drop table {}: {}", name, e);
            error_response(&e)
        }
    }
}
