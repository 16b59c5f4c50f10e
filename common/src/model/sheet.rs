use crate::model::revision::Revision;
use serde::{Deserialize, Serialize};

/// Content of the remote spreadsheet's first sheet at fetch time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetSnapshot {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMetadata {
    pub title: String,
}

/// Response body of `GET /api/sheets/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub spreadsheet_id: String,
    pub spreadsheet_name: String,
    pub revisions: Vec<Revision>,
}
