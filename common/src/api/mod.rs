use serde::{Deserialize, Serialize};

/// Response body of `POST /api/files/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub spreadsheet_id: String,
    /// `true` when the upload created the spreadsheet, `false` when it overwrote it.
    pub created: bool,
    pub rows: usize,
}

/// Response body of `POST /api/sheets/publish`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub spreadsheet_id: String,
    pub created: bool,
}
