use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A column-oriented upload: each key is a column name mapped to that
/// column's values, top to bottom.
///
/// Key order is the order the columns appear in the uploaded file, which
/// requires `serde_json`'s `preserve_order` feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceDocument {
    pub columns: Map<String, Value>,
}

impl SourceDocument {
    pub fn new(columns: Map<String, Value>) -> Self {
        Self { columns }
    }
}
