use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync bookkeeping for the single tracked spreadsheet.
///
/// Serialized with the field names of the `sheet_id.json` state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionState {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// Watermark: the newest revision already synchronized. Never moves backward.
    #[serde(default)]
    pub latest_modified_time: Option<DateTime<Utc>>,
}

/// One entry of the remote change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    pub modified_time: DateTime<Utc>,
    #[serde(default)]
    pub modified_by: Option<String>,
}
