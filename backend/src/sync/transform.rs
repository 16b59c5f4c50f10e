//! Pure conversions between the upload, spreadsheet and table shapes.
//!
//! Column order is preserved end to end: the order of keys in the uploaded
//! document becomes the header order in the spreadsheet and the column order
//! of the table. Column 0 is always the required key column; every other
//! column is nullable text.

use crate::error::{Result, SyncError};
use common::model::document::SourceDocument;
use common::model::payload::{
    Cell, ColumnDescriptor, ColumnType, SheetDocument, SqlDocument, TablePayload, SURROGATE_KEY,
};
use common::model::sheet::SpreadsheetSnapshot;
use serde_json::Value;
use std::collections::HashSet;

/// Parses the raw bytes of an uploaded file.
pub fn parse_document(bytes: &[u8]) -> Result<SourceDocument> {
    serde_json::from_slice(bytes)
        .map_err(|e| SyncError::malformed(format!("expected a JSON object of columns: {}", e)))
}

fn cell_text(value: &Value) -> Cell {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn descriptors<'a>(names: impl Iterator<Item = &'a str>) -> Result<Vec<ColumnDescriptor>> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for (index, name) in names.enumerate() {
        if name.trim().is_empty() {
            return Err(SyncError::malformed(format!("column {} has an empty name", index + 1)));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(SyncError::malformed(format!("column '{}' appears twice", name)));
        }
        columns.push(ColumnDescriptor {
            name: name.to_string(),
            column_type: if index == 0 {
                ColumnType::RequiredText
            } else {
                ColumnType::NullableText
            },
        });
    }
    if columns.is_empty() {
        return Err(SyncError::malformed("document has no columns"));
    }
    Ok(columns)
}

/// Zips a column-major document into rows.
pub fn transform(document: &SourceDocument) -> Result<TablePayload> {
    let columns = descriptors(document.columns.keys().map(String::as_str))?;

    let mut values = Vec::with_capacity(columns.len());
    for (name, column) in &document.columns {
        match column {
            Value::Array(items) => values.push(items),
            _ => {
                return Err(SyncError::malformed(format!(
                    "column '{}' is not an array",
                    name
                )))
            }
        }
    }

    let height = values[0].len();
    if let Some((name, other)) = document
        .columns
        .keys()
        .zip(&values)
        .find(|(_, items)| items.len() != height)
    {
        return Err(SyncError::malformed(format!(
            "column '{}' has {} values, expected {}",
            name,
            other.len(),
            height
        )));
    }

    // The key column becomes NOT NULL in the table.
    if let Some(index) = values[0]
        .iter()
        .position(|v| cell_text(v).is_none_or(|t| t.is_empty()))
    {
        return Err(SyncError::malformed(format!(
            "key column '{}' is empty at position {}",
            columns[0].name,
            index + 1
        )));
    }

    let rows = (0..height)
        .map(|i| values.iter().map(|items| cell_text(&items[i])).collect())
        .collect();

    Ok(TablePayload { columns, rows })
}

/// Converts fetched spreadsheet content back into a payload.
///
/// The values API drops trailing empty cells, so short rows are padded with
/// nulls; a row wider than the header is rejected.
pub fn from_snapshot(snapshot: &SpreadsheetSnapshot) -> Result<TablePayload> {
    let columns = descriptors(snapshot.header.iter().map(String::as_str))?;
    let width = columns.len();

    let mut rows = Vec::with_capacity(snapshot.rows.len());
    for (index, row) in snapshot.rows.iter().enumerate() {
        if row.len() > width {
            return Err(SyncError::malformed(format!(
                "sheet row {} has {} cells but the header has {}",
                index + 2,
                row.len(),
                width
            )));
        }
        let mut cells: Vec<Cell> = row
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.clone()) })
            .collect();
        cells.resize(width, None);
        rows.push(cells);
    }

    Ok(TablePayload { columns, rows })
}

/// Rebuilds a payload from the `sheets.json` cache.
pub fn from_sheet_document(document: &SheetDocument) -> Result<TablePayload> {
    from_snapshot(&SpreadsheetSnapshot {
        title: document.sheet.title.clone(),
        header: document.sheet.columns.clone(),
        rows: document.data.clone(),
    })
}

/// Rebuilds a payload from the `sql.json` cache, ignoring the surrogate key.
pub fn from_sql_document(document: &SqlDocument) -> Result<TablePayload> {
    let columns = descriptors(
        document
            .table
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !name.eq_ignore_ascii_case(SURROGATE_KEY)),
    )?;

    let rows = document
        .data
        .iter()
        .map(|object| {
            columns
                .iter()
                .map(|c| object.get(&c.name).and_then(cell_text))
                .collect()
        })
        .collect();

    Ok(TablePayload { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> SourceDocument {
        serde_json::from_value(value).unwrap()
    }

    fn texts(row: &[Cell]) -> Vec<&str> {
        row.iter().map(|c| c.as_deref().unwrap_or("<null>")).collect()
    }

    #[test]
    fn two_column_document_becomes_two_rows() {
        let payload = transform(&doc(json!({"Name": ["a", "b"], "Value": ["1", "2"]}))).unwrap();
        assert_eq!(payload.header(), vec!["Name", "Value"]);
        assert_eq!(payload.rows.len(), 2);
        assert_eq!(texts(&payload.rows[0]), vec!["a", "1"]);
        assert_eq!(texts(&payload.rows[1]), vec!["b", "2"]);
        assert_eq!(payload.columns[0].column_type, ColumnType::RequiredText);
        assert_eq!(payload.columns[1].column_type, ColumnType::NullableText);
    }

    #[test]
    fn rows_are_positional_zips_of_the_columns() {
        let cases = vec![
            json!({"k": []}),
            json!({"k": ["x"]}),
            json!({"k": ["1", "2", "3"], "a": ["4", "5", "6"], "b": ["7", "8", "9"]}),
            json!({"z": ["q", "r"], "y": ["s", "t"]}),
        ];
        for case in cases {
            let document = doc(case);
            let payload = transform(&document).unwrap();
            let height = document.columns.values().next().unwrap().as_array().unwrap().len();
            assert_eq!(payload.rows.len(), height);
            for (j, column) in document.columns.values().enumerate() {
                for (i, value) in column.as_array().unwrap().iter().enumerate() {
                    assert_eq!(payload.rows[i][j].as_deref(), value.as_str());
                }
            }
        }
    }

    #[test]
    fn key_order_of_the_upload_is_kept() {
        let document = parse_document(br#"{"Zeta": ["1"], "Alpha": ["2"], "Mid": ["3"]}"#).unwrap();
        let payload = transform(&document).unwrap();
        assert_eq!(payload.header(), vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn unequal_lengths_are_malformed() {
        let err = transform(&doc(json!({"Name": ["a", "b"], "Value": ["1"]}))).unwrap_err();
        assert!(matches!(err, SyncError::MalformedInput(_)));
        assert!(err.to_string().contains("Value"));
    }

    #[test]
    fn null_or_empty_key_cells_are_malformed() {
        for key in [json!(["a", null]), json!(["", "b"])] {
            let err = transform(&doc(json!({"Name": key, "Value": ["1", "2"]}))).unwrap_err();
            assert!(matches!(err, SyncError::MalformedInput(_)));
        }
        // Other columns may hold nulls.
        assert!(transform(&doc(json!({"Name": ["a"], "Value": [null]}))).is_ok());
    }

    #[test]
    fn empty_document_is_malformed() {
        assert!(matches!(
            transform(&doc(json!({}))),
            Err(SyncError::MalformedInput(_))
        ));
    }

    #[test]
    fn non_array_columns_and_non_objects_are_malformed() {
        assert!(transform(&doc(json!({"Name": "a"}))).is_err());
        assert!(matches!(
            parse_document(b"[1, 2]"),
            Err(SyncError::MalformedInput(_))
        ));
    }

    #[test]
    fn scalars_render_as_text_and_null_stays_null() {
        let payload =
            transform(&doc(json!({"k": ["a", "b"], "v": [1.5, null], "f": [true, {"x": 1}]})))
                .unwrap();
        assert_eq!(
            payload.rows[0],
            vec![Some("a".into()), Some("1.5".into()), Some("true".into())]
        );
        assert_eq!(payload.rows[1], vec![Some("b".into()), None, Some("{\"x\":1}".into())]);
    }

    #[test]
    fn snapshot_rows_are_padded_to_the_header() {
        let snapshot = SpreadsheetSnapshot {
            title: "New Sheet".into(),
            header: vec!["Name".into(), "Value".into()],
            rows: vec![vec!["a".into(), "1".into()], vec!["b".into()]],
        };
        let payload = from_snapshot(&snapshot).unwrap();
        assert_eq!(payload.rows[1], vec![Some("b".into()), None]);
    }

    #[test]
    fn snapshot_rows_wider_than_the_header_are_malformed() {
        let snapshot = SpreadsheetSnapshot {
            title: "New Sheet".into(),
            header: vec!["Name".into()],
            rows: vec![vec!["a".into(), "extra".into()]],
        };
        assert!(matches!(from_snapshot(&snapshot), Err(SyncError::MalformedInput(_))));
    }

    #[test]
    fn snapshot_without_header_or_with_duplicates_is_malformed() {
        assert!(from_snapshot(&SpreadsheetSnapshot::default()).is_err());
        let duplicated = SpreadsheetSnapshot {
            title: "t".into(),
            header: vec!["Name".into(), "name".into()],
            rows: vec![],
        };
        assert!(from_snapshot(&duplicated).is_err());
    }

    #[test]
    fn sql_cache_skips_the_surrogate_key() {
        let payload = transform(&doc(json!({"Name": ["a"], "Value": [null]}))).unwrap();
        let restored = from_sql_document(&payload.to_sql_document("new_table")).unwrap();
        assert_eq!(restored, payload);
    }
}
