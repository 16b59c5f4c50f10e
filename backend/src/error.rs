//! Error taxonomy shared by the sync components and the HTTP handlers.

use actix_web::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The uploaded document or the fetched spreadsheet has an unusable shape.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A sync or lookup was attempted before any spreadsheet was created.
    #[error("no spreadsheet is tracked yet")]
    MissingExternalId,

    #[error("spreadsheet '{tracked}' is already tracked, refusing to track '{requested}'")]
    ExternalIdConflict { tracked: String, requested: String },

    #[error("spreadsheet write failed: {0}")]
    RemoteWrite(String),

    #[error("spreadsheet read failed: {0}")]
    RemoteRead(String),

    #[error("table schema error: {0}")]
    Schema(String),

    #[error("table write failed: {0}")]
    Write(String),

    /// Local state files (`sheet_id.json`, `sheets.json`, `sql.json`).
    #[error("local state error: {0}")]
    State(String),
}

impl SyncError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Status code used when the error reaches a request handler.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            SyncError::MissingExternalId => StatusCode::NOT_FOUND,
            SyncError::ExternalIdConflict { .. } => StatusCode::CONFLICT,
            SyncError::RemoteWrite(_) | SyncError::RemoteRead(_) => StatusCode::BAD_GATEWAY,
            SyncError::Schema(_) | SyncError::Write(_) | SyncError::State(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::State(err.to_string())
    }
}
