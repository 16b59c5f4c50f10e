//! Collaborators the sync components talk to.
//!
//! - `google`: Google Sheets v4 for spreadsheet content and Google Drive v3
//!   for revision history, permissions and deletion.
//! - `sqlite`: the relational store the table is materialized into.
//!
//! The sync layer only sees the traits below, so tests swap in the in-memory
//! fakes from `fake`.

pub mod google;
pub mod sqlite;

#[cfg(test)]
pub mod fake;

use crate::error::Result;
use async_trait::async_trait;
use common::model::payload::{Cell, ColumnDescriptor, TablePayload};
use common::model::revision::Revision;
use common::model::sheet::{SheetMetadata, SpreadsheetSnapshot};
use serde_json::{Map, Value};

/// Role granted to the collaborator on every spreadsheet this service creates.
pub const COLLABORATOR_ROLE: &str = "writer";

#[async_trait]
pub trait RevisionSource: Send + Sync {
    /// The change history of `resource_id`, in the order the service lists it.
    async fn list_revisions(&self, resource_id: &str) -> Result<Vec<Revision>>;
}

#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    /// Creates a spreadsheet whose first sheet is titled `title` and holds
    /// `rows` from `A1`. Returns the new spreadsheet id.
    async fn create(&self, title: &str, rows: &[Vec<String>]) -> Result<String>;
    async fn get_metadata(&self, resource_id: &str) -> Result<SheetMetadata>;
    /// Empties every cell of `range` (A1 notation; a bare sheet title covers
    /// the whole sheet).
    async fn clear_range(&self, resource_id: &str, range: &str) -> Result<()>;
    /// Writes `rows` starting at the top-left cell of `range` (A1 notation).
    /// Cells outside the written block keep their content.
    async fn overwrite_range(
        &self,
        resource_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<()>;
    /// Fetches the first sheet's values.
    async fn get(&self, resource_id: &str) -> Result<SpreadsheetSnapshot>;
    async fn grant_access(&self, resource_id: &str, principal: &str, role: &str) -> Result<()>;
    async fn delete(&self, resource_id: &str) -> Result<()>;
}

#[async_trait]
pub trait RelationalStore: Send + Sync {
    async fn ping(&self) -> Result<()>;
    async fn drop_table(&self, name: &str) -> Result<()>;
    /// Creates `name` with the surrogate key followed by `columns`.
    async fn create_table(&self, name: &str, columns: &[ColumnDescriptor]) -> Result<()>;
    /// Appends `rows` to `name`, one cell per entry of `columns`.
    async fn bulk_insert(
        &self,
        name: &str,
        columns: &[ColumnDescriptor],
        rows: &[Vec<Cell>],
    ) -> Result<usize>;
    /// `drop_table`, `create_table` and `bulk_insert` in one transaction.
    /// Returns the number of inserted rows.
    async fn replace_table(&self, name: &str, payload: &TablePayload) -> Result<usize>;
    async fn select_all(&self, name: &str) -> Result<Vec<Map<String, Value>>>;
}
