use crate::error::{Result, SyncError};
use crate::services::error_response;
use crate::sync::coordinator::SyncService;
use crate::sync::transform;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::api::IngestReport;
use futures_util::StreamExt;
use log::{error, info};
use std::io::Write;
use tempfile::NamedTempFile;

/// An uploaded file spooled to disk, with the name the client gave it.
struct SpooledUpload {
    file: NamedTempFile,
    filename: String,
}

/// Actix web handler for `POST /api/files/upload`.
///
/// # Arguments
/// * `service` - The shared `SyncService`, injected by Actix.
/// * `payload` - The multipart stream; only the `file` field is read.
///
/// # Returns
/// `200 OK` with the `IngestReport` as JSON, or the status mapped from the
/// `SyncError` with its message as body.
pub async fn process(service: web::Data<SyncService>, payload: Multipart) -> impl Responder {
    match upload_document(&service, payload).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            error!("upload failed: {}", e);
            error_response(&e)
        }
    }
}

async fn upload_document(service: &SyncService, payload: Multipart) -> Result<IngestReport> {
    let upload = receive_file(payload).await?;
    info!(
        "received {} ({})",
        upload.filename,
        upload.file.path().display()
    );

    let bytes = tokio::fs::read(upload.file.path()).await?;
    let document = transform::parse_document(&bytes)?;
    service.ingest(&document).await
}

fn multipart_error(e: impl std::fmt::Display) -> SyncError {
    SyncError::malformed(format!("multipart: {}", e))
}

/// Streams the `file` field into a temporary file. Other fields are ignored.
async fn receive_file(mut payload: Multipart) -> Result<SpooledUpload> {
    let mut upload: Option<SpooledUpload> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(multipart_error)?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if field_name.as_deref() != Some("file") {
            continue;
        }
        if upload.is_some() {
            return Err(SyncError::malformed("only one file per upload"));
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !filename.to_ascii_lowercase().ends_with(".json") {
            return Err(SyncError::malformed("the file must end with .json"));
        }

        let mut file = NamedTempFile::new()?;
        while let Some(chunk) = field.next().await {
            file.write_all(&chunk.map_err(multipart_error)?)?;
        }
        file.flush()?;
        upload = Some(SpooledUpload { file, filename });
    }

    upload.ok_or_else(|| SyncError::malformed("no file uploaded"))
}
