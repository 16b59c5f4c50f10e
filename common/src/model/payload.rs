//! Row-oriented shapes derived from a [`SourceDocument`](super::document::SourceDocument)
//! or from a fetched spreadsheet.
//!
//! [`TablePayload`] is the in-memory form. [`SheetDocument`] and [`SqlDocument`]
//! are the on-disk cache forms written to `sheets.json` and `sql.json`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the auto-incrementing key prepended to every materialized table.
pub const SURROGATE_KEY: &str = "id";
/// SQL type of [`SURROGATE_KEY`].
pub const SURROGATE_KEY_TYPE: &str = "INTEGER PRIMARY KEY AUTOINCREMENT";

/// A single cell. `None` is an empty spreadsheet cell or a SQL `NULL`.
pub type Cell = Option<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Column 0: the key column, never null.
    RequiredText,
    NullableText,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::RequiredText => "VARCHAR(255) NOT NULL",
            ColumnType::NullableText => "VARCHAR(255)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub column_type: ColumnType,
}

/// Normalized rows plus the schema inferred for them.
///
/// Every row holds exactly one cell per column, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePayload {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<Cell>>,
}

impl TablePayload {
    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Data rows as spreadsheet cells, `None` rendered as an empty string.
    pub fn data_values(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.clone().unwrap_or_default()).collect())
            .collect()
    }

    /// Header followed by the data rows, ready to write from cell `A1`.
    pub fn sheet_values(&self) -> Vec<Vec<String>> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.header());
        values.extend(self.data_values());
        values
    }

    /// Each row as a `column -> value` object.
    pub fn row_objects(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| {
                        let value = cell.clone().map(Value::String).unwrap_or(Value::Null);
                        (column.name.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn to_sheet_document(&self, title: &str) -> SheetDocument {
        SheetDocument {
            sheet: SheetHeader {
                title: title.to_string(),
                columns: self.header(),
            },
            data: self.data_values(),
        }
    }

    pub fn to_sql_document(&self, table: &str) -> SqlDocument {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(SqlColumn {
            name: SURROGATE_KEY.to_string(),
            sql_type: SURROGATE_KEY_TYPE.to_string(),
        });
        columns.extend(self.columns.iter().map(|c| SqlColumn {
            name: c.name.clone(),
            sql_type: c.column_type.sql_type().to_string(),
        }));

        SqlDocument {
            table: SqlTable {
                name: table.to_string(),
                columns,
            },
            data: self.row_objects(),
        }
    }
}

/// Spreadsheet-shaped cache (`sheets.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetDocument {
    pub sheet: SheetHeader,
    pub data: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetHeader {
    pub title: String,
    pub columns: Vec<String>,
}

/// SQL-shaped cache (`sql.json`). `table.columns` includes the surrogate key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlDocument {
    pub table: SqlTable,
    pub data: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlTable {
    pub name: String,
    pub columns: Vec<SqlColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: String,
}
