//! In-memory collaborators for tests.

use crate::clients::{RelationalStore, RevisionSource, SpreadsheetStore};
use crate::error::{Result, SyncError};
use crate::state::revision_store::RevisionStore;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use common::model::payload::{Cell, ColumnDescriptor, TablePayload, SURROGATE_KEY};
use common::model::revision::{Revision, RevisionState};
use common::model::sheet::{SheetMetadata, SpreadsheetSnapshot};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared, ordered record of side effects across several fakes.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 1, hour, minute, 0).unwrap()
}

pub fn revision(id: &str, time: DateTime<Utc>) -> Revision {
    Revision {
        id: id.to_string(),
        modified_time: time,
        modified_by: None,
    }
}

#[derive(Default)]
pub struct MemoryRevisionStore {
    state: Mutex<RevisionState>,
    events: Option<EventLog>,
}

impl MemoryRevisionStore {
    pub fn with_state(state: RevisionState) -> Self {
        Self {
            state: Mutex::new(state),
            events: None,
        }
    }

    pub fn logging_to(mut self, events: EventLog) -> Self {
        self.events = Some(events);
        self
    }

    pub fn snapshot(&self) -> RevisionState {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl RevisionStore for MemoryRevisionStore {
    async fn load(&self) -> Result<RevisionState> {
        Ok(self.snapshot())
    }

    async fn save(&self, state: &RevisionState) -> Result<()> {
        if let Some(events) = &self.events {
            events.lock().unwrap().push("save_revision_state".to_string());
        }
        *self.state.lock().unwrap() = state.clone();
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.state.lock().unwrap() = RevisionState::default();
        Ok(())
    }
}

/// Stands in for both the spreadsheet service and its revision history.
///
/// Each spreadsheet is a grid of cells. Writes land cell by cell from `A1`
/// like the values API, so cells outside a write keep their old content.
#[derive(Default)]
pub struct FakeSheets {
    pub revisions: Mutex<Vec<Revision>>,
    /// Every mutating call, e.g. `create:New Sheet` or `overwrite:sheet-1:'New Sheet'!A1`.
    pub calls: Mutex<Vec<String>>,
    pub grids: Mutex<HashMap<String, Vec<Vec<String>>>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    created: AtomicUsize,
}

pub const FAKE_TITLE: &str = "New Sheet";

impl FakeSheets {
    pub fn set_revisions(&self, revisions: Vec<Revision>) {
        *self.revisions.lock().unwrap() = revisions;
    }

    /// Replaces the content of `sheet-1`, the id the test harnesses track.
    pub fn set_snapshot(&self, header: &[&str], rows: &[&[&str]]) {
        let mut grid = vec![header.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
        grid.extend(rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()));
        self.grids.lock().unwrap().insert("sheet-1".to_string(), grid);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteRead("status=503".into()));
        }
        Ok(())
    }

    fn record_write(&self, call: String) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteWrite("status=401".into()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

/// What the values API returns for a grid: trailing empty cells and trailing
/// empty rows are dropped.
fn visible_values(grid: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut values: Vec<Vec<String>> = grid
        .iter()
        .map(|row| {
            let width = row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
            row[..width].to_vec()
        })
        .collect();
    while values.last().is_some_and(|row| row.is_empty()) {
        values.pop();
    }
    values
}

#[async_trait]
impl RevisionSource for FakeSheets {
    async fn list_revisions(&self, _resource_id: &str) -> Result<Vec<Revision>> {
        self.check_read()?;
        Ok(self.revisions.lock().unwrap().clone())
    }
}

#[async_trait]
impl SpreadsheetStore for FakeSheets {
    async fn create(&self, title: &str, rows: &[Vec<String>]) -> Result<String> {
        self.record_write(format!("create:{}", title))?;
        let id = format!("sheet-{}", self.created.fetch_add(1, Ordering::SeqCst) + 1);
        self.grids.lock().unwrap().insert(id.clone(), rows.to_vec());
        Ok(id)
    }

    async fn get_metadata(&self, _resource_id: &str) -> Result<SheetMetadata> {
        self.check_read()?;
        Ok(SheetMetadata {
            title: FAKE_TITLE.to_string(),
        })
    }

    async fn clear_range(&self, resource_id: &str, range: &str) -> Result<()> {
        self.record_write(format!("clear:{}:{}", resource_id, range))?;
        if let Some(grid) = self.grids.lock().unwrap().get_mut(resource_id) {
            grid.clear();
        }
        Ok(())
    }

    async fn overwrite_range(
        &self,
        resource_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        self.record_write(format!("overwrite:{}:{}", resource_id, range))?;
        let mut grids = self.grids.lock().unwrap();
        let grid = grids.entry(resource_id.to_string()).or_default();
        for (r, row) in rows.iter().enumerate() {
            if grid.len() <= r {
                grid.resize(r + 1, Vec::new());
            }
            for (c, value) in row.iter().enumerate() {
                if grid[r].len() <= c {
                    grid[r].resize(c + 1, String::new());
                }
                grid[r][c] = value.clone();
            }
        }
        Ok(())
    }

    async fn get(&self, resource_id: &str) -> Result<SpreadsheetSnapshot> {
        self.check_read()?;
        let grids = self.grids.lock().unwrap();
        let grid = grids
            .get(resource_id)
            .ok_or_else(|| SyncError::RemoteRead(format!("status=404 {}", resource_id)))?;
        let mut values = visible_values(grid).into_iter();
        Ok(SpreadsheetSnapshot {
            title: FAKE_TITLE.to_string(),
            header: values.next().unwrap_or_default(),
            rows: values.collect(),
        })
    }

    async fn grant_access(&self, resource_id: &str, principal: &str, role: &str) -> Result<()> {
        self.record_write(format!("grant:{}:{}:{}", resource_id, principal, role))
    }

    async fn delete(&self, resource_id: &str) -> Result<()> {
        self.record_write(format!("delete:{}", resource_id))?;
        self.grids.lock().unwrap().remove(resource_id);
        Ok(())
    }
}

/// Relational store keeping whole payloads per table name. Refuses what the
/// SQLite schema refuses: a column named like the surrogate key, or a null
/// in the NOT NULL key column.
#[derive(Default)]
pub struct FakeTables {
    pub tables: Mutex<HashMap<String, TablePayload>>,
    pub writes: AtomicUsize,
    events: Option<EventLog>,
}

impl FakeTables {
    pub fn logging_to(events: EventLog) -> Self {
        Self {
            events: Some(events),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn table(&self, name: &str) -> Option<TablePayload> {
        self.tables.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl RelationalStore for FakeTables {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn drop_table(&self, name: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.tables.lock().unwrap().remove(name);
        Ok(())
    }

    async fn create_table(&self, name: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        if let Some(column) = columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(SURROGATE_KEY))
        {
            return Err(SyncError::schema(format!(
                "create {}: duplicate column {}",
                name, column.name
            )));
        }
        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(name) {
            return Err(SyncError::schema(format!("create {}: table exists", name)));
        }
        tables.insert(
            name.to_string(),
            TablePayload {
                columns: columns.to_vec(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn bulk_insert(
        &self,
        name: &str,
        _columns: &[ColumnDescriptor],
        rows: &[Vec<Cell>],
    ) -> Result<usize> {
        if rows.iter().any(|r| r.first().is_some_and(Option::is_none)) {
            return Err(SyncError::Write(format!(
                "insert into {}: NOT NULL constraint failed",
                name
            )));
        }
        let mut tables = self.tables.lock().unwrap();
        let table = tables
            .get_mut(name)
            .ok_or_else(|| SyncError::Write(format!("no such table: {}", name)))?;
        table.rows.extend_from_slice(rows);
        Ok(rows.len())
    }

    /// Same checks as `create_table` and `bulk_insert`, applied before anything
    /// is replaced.
    async fn replace_table(&self, name: &str, payload: &TablePayload) -> Result<usize> {
        let staging = FakeTables::default();
        staging.create_table(name, &payload.columns).await?;
        let inserted = staging.bulk_insert(name, &payload.columns, &payload.rows).await?;

        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(events) = &self.events {
            events.lock().unwrap().push("replace_table".to_string());
        }
        self.tables
            .lock()
            .unwrap()
            .insert(name.to_string(), payload.clone());
        Ok(inserted)
    }

    async fn select_all(&self, name: &str) -> Result<Vec<Map<String, Value>>> {
        self.table(name)
            .map(|t| t.row_objects())
            .ok_or_else(|| SyncError::schema(format!("no such table: {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::payload::ColumnType;

    fn one_column(name: &str, rows: Vec<Vec<Option<String>>>) -> TablePayload {
        TablePayload {
            columns: vec![ColumnDescriptor {
                name: name.into(),
                column_type: ColumnType::RequiredText,
            }],
            rows,
        }
    }

    #[tokio::test]
    async fn tables_refuse_what_sqlite_refuses() {
        let tables = FakeTables::default();
        assert!(matches!(
            tables.replace_table("t", &one_column("Id", vec![])).await,
            Err(SyncError::Schema(_))
        ));
        assert!(matches!(
            tables.replace_table("t", &one_column("Name", vec![vec![None]])).await,
            Err(SyncError::Write(_))
        ));
        assert_eq!(tables.writes(), 0);
    }

    #[tokio::test]
    async fn sheets_overwrite_cell_by_cell() {
        let sheets = FakeSheets::default();
        sheets.set_snapshot(&["A", "B", "C"], &[&["1", "2", "3"], &["4", "5", "6"]]);
        sheets
            .overwrite_range("sheet-1", "'New Sheet'!A1", &[vec!["x".into()]])
            .await
            .unwrap();

        let snapshot = sheets.get("sheet-1").await.unwrap();
        assert_eq!(snapshot.header, vec!["x", "B", "C"]);
        assert_eq!(snapshot.rows.len(), 2);

        sheets.clear_range("sheet-1", "'New Sheet'").await.unwrap();
        let snapshot = sheets.get("sheet-1").await.unwrap();
        assert!(snapshot.header.is_empty());
        assert!(snapshot.rows.is_empty());
    }
}
