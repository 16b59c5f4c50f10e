use crate::clients::RelationalStore;
use crate::config::is_valid_identifier;
use crate::error::{Result, SyncError};
use common::model::payload::{TablePayload, SURROGATE_KEY};
use log::info;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Replaces the destination table with the content of a payload.
///
/// Materializing is destructive: the table is dropped and recreated on every
/// call. The store does drop, create and insert in one transaction, so a
/// failure leaves the previous table in place.
pub struct TableMaterializer {
    store: Arc<dyn RelationalStore>,
    table: String,
}

/// Checks a payload's shape before anything touches the store.
fn validate(payload: &TablePayload) -> Result<()> {
    if payload.columns.is_empty() {
        return Err(SyncError::schema("payload has no columns"));
    }

    let mut seen = HashSet::new();
    for column in &payload.columns {
        let lowered = column.name.to_lowercase();
        if lowered == SURROGATE_KEY {
            return Err(SyncError::schema(format!(
                "column '{}' collides with the surrogate key",
                column.name
            )));
        }
        if !seen.insert(lowered) {
            return Err(SyncError::schema(format!("column '{}' appears twice", column.name)));
        }
    }

    let width = payload.columns.len();
    if let Some((index, row)) = payload.rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(SyncError::schema(format!(
            "row {} has {} values for {} columns",
            index + 1,
            row.len(),
            width
        )));
    }

    // Column 0 is NOT NULL in the table.
    if let Some(index) = payload.rows.iter().position(|r| r[0].is_none()) {
        return Err(SyncError::schema(format!(
            "row {} has no value for key column '{}'",
            index + 1,
            payload.columns[0].name
        )));
    }
    Ok(())
}

fn check_table_name(name: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(SyncError::malformed(format!("'{}' is not a valid table name", name)))
    }
}

impl TableMaterializer {
    pub fn new(store: Arc<dyn RelationalStore>, table: String) -> Self {
        Self { store, table }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Checks that the table would accept `payload`, without touching the store.
    pub fn validate(&self, payload: &TablePayload) -> Result<()> {
        validate(payload)
    }

    /// Returns the number of rows written.
    pub async fn materialize(&self, payload: &TablePayload) -> Result<usize> {
        validate(payload)?;
        let rows = self.store.replace_table(&self.table, payload).await?;
        info!("materialized {} rows into {}", rows, self.table);
        Ok(rows)
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    pub async fn select_all(&self, table: &str) -> Result<Vec<Map<String, Value>>> {
        check_table_name(table)?;
        self.store.select_all(table).await
    }

    pub async fn drop_table(&self, table: &str) -> Result<()> {
        check_table_name(table)?;
        self.store.drop_table(table).await?;
        info!("dropped table {}", table);
        Ok(())
    }
}
