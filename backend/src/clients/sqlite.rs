use crate::clients::RelationalStore;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use common::model::payload::{
    Cell, ColumnDescriptor, TablePayload, SURROGATE_KEY, SURROGATE_KEY_TYPE,
};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// SQLite-backed relational store. Each operation opens its own connection on
/// a blocking thread.
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&path)
                .map_err(|e| SyncError::Write(format!("open {}: {}", path.display(), e)))?;
            op(&mut conn)
        })
        .await
        .map_err(|e| SyncError::Write(format!("join error: {}", e)))?
    }
}

/// Quotes an identifier for SQLite, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table(conn: &Connection, name: &str, columns: &[ColumnDescriptor]) -> Result<()> {
    let mut definitions = vec![format!("{} {}", quote_ident(SURROGATE_KEY), SURROGATE_KEY_TYPE)];
    definitions.extend(
        columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql_type())),
    );
    let ddl = format!("CREATE TABLE {} ({})", quote_ident(name), definitions.join(", "));
    conn.execute(&ddl, [])
        .map_err(|e| SyncError::schema(format!("create {}: {}", name, e)))?;
    Ok(())
}

fn bulk_insert(
    conn: &Connection,
    name: &str,
    columns: &[ColumnDescriptor],
    rows: &[Vec<Cell>],
) -> Result<usize> {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        column_list,
        placeholders
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| SyncError::Write(format!("prepare insert into {}: {}", name, e)))?;
    for (index, row) in rows.iter().enumerate() {
        stmt.execute(params_from_iter(row.iter()))
            .map_err(|e| {
                SyncError::Write(format!("insert row {} into {}: {}", index + 1, name, e))
            })?;
    }
    Ok(rows.len())
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            Value::String(String::from_utf8_lossy(t).into_owned())
        }
    }
}

#[async_trait]
impl RelationalStore for SqliteStore {
    async fn ping(&self) -> Result<()> {
        self.run(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(|e| SyncError::Write(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn drop_table(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.run(move |conn| {
            conn.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(&name)), [])
                .map_err(|e| SyncError::schema(format!("drop {}: {}", name, e)))?;
            Ok(())
        })
        .await
    }

    async fn create_table(&self, name: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        let name = name.to_string();
        let columns = columns.to_vec();
        self.run(move |conn| create_table(conn, &name, &columns)).await
    }

    async fn bulk_insert(
        &self,
        name: &str,
        columns: &[ColumnDescriptor],
        rows: &[Vec<Cell>],
    ) -> Result<usize> {
        let name = name.to_string();
        let columns = columns.to_vec();
        let rows = rows.to_vec();
        self.run(move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| SyncError::Write(format!("begin: {}", e)))?;
            let inserted = bulk_insert(&tx, &name, &columns, &rows)?;
            tx.commit()
                .map_err(|e| SyncError::Write(format!("commit {}: {}", name, e)))?;
            Ok(inserted)
        })
        .await
    }

    async fn replace_table(&self, name: &str, payload: &TablePayload) -> Result<usize> {
        let name = name.to_string();
        let payload = payload.clone();
        self.run(move |conn| {
            let tx = conn
                .transaction()
                .map_err(|e| SyncError::Write(format!("begin: {}", e)))?;
            tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(&name)), [])
                .map_err(|e| SyncError::schema(format!("drop {}: {}", name, e)))?;
            create_table(&tx, &name, &payload.columns)?;
            let inserted = bulk_insert(&tx, &name, &payload.columns, &payload.rows)?;
            // Dropping `tx` without commit rolls back, so any `?` above keeps the old table.
            tx.commit()
                .map_err(|e| SyncError::Write(format!("commit {}: {}", name, e)))?;
            Ok(inserted)
        })
        .await
    }

    async fn select_all(&self, name: &str) -> Result<Vec<Map<String, Value>>> {
        let name = name.to_string();
        self.run(move |conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT * FROM {}", quote_ident(&name)))
                .map_err(|e| SyncError::schema(format!("select from {}: {}", name, e)))?;
            let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();
            let mut rows = stmt
                .query([])
                .map_err(|e| SyncError::schema(format!("select from {}: {}", name, e)))?;

            let mut out = Vec::new();
            while let Some(row) = rows
                .next()
                .map_err(|e| SyncError::schema(format!("read {}: {}", name, e)))?
            {
                let mut object = Map::with_capacity(names.len());
                for (i, column) in names.iter().enumerate() {
                    let value = row
                        .get_ref(i)
                        .map_err(|e| {
                            SyncError::schema(format!("read {}.{}: {}", name, column, e))
                        })?;
                    object.insert(column.clone(), value_to_json(value));
                }
                out.push(object);
            }
            Ok(out)
        })
        .await
    }
}
