use crate::error::{Result, SyncError};
use crate::state::{read_json, write_json_atomic};
use common::model::payload::{SheetDocument, SqlDocument};
use std::path::{Path, PathBuf};

pub const SHEET_CACHE_FILE: &str = "sheets.json";
pub const SQL_CACHE_FILE: &str = "sql.json";

/// The last derived spreadsheet and SQL shapes, kept on disk so they can be
/// republished or rematerialized without a new upload.
pub struct PayloadCache {
    dir: PathBuf,
}

impl PayloadCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn store(&self, sheet: &SheetDocument, sql: &SqlDocument) -> Result<()> {
        write_json_atomic(&self.dir.join(SHEET_CACHE_FILE), sheet).await?;
        write_json_atomic(&self.dir.join(SQL_CACHE_FILE), sql).await
    }

    pub async fn load_sheet(&self) -> Result<SheetDocument> {
        load_required(&self.dir.join(SHEET_CACHE_FILE)).await
    }

    pub async fn load_sql(&self) -> Result<SqlDocument> {
        load_required(&self.dir.join(SQL_CACHE_FILE)).await
    }
}

async fn load_required<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    read_json(path)
        .await?
        .ok_or_else(|| SyncError::State(format!("{} has not been written yet", path.display())))
}
