//! SQLite-backed `DataStore`.
//!
//! One connection sits behind a mutex and every statement runs on tokio's
//! blocking pool, so concurrent invocations queue on the lock instead of
//! blocking the async executor.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use serde_json::{Number, Value};
use tracing::debug;

use super::{DataStore, QueryOutput, Row, SqlValue};
use crate::error::DataStoreError;

/// DDL for the `todos` table. Used to bootstrap local and test databases.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    todo TEXT NOT NULL
);
";

/// Shared handle to a single SQLite connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DataStoreError> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, DataStoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Create the `todos` table if it does not exist yet.
    pub fn init_schema(&self) -> Result<(), DataStoreError> {
        let conn = self.conn.lock().map_err(|_| poisoned())?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryOutput, DataStoreError> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        let params = params.to_vec();
        debug!(sql = %sql, params = params.len(), "executing statement");

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| poisoned())?;
            run_statement(&conn, &sql, &params).map_err(|e| DataStoreError::from(e).with_sql(&sql))
        })
        .await
        .map_err(|e| DataStoreError::new("ER_TASK_ABORTED", 0, e.to_string()))?
    }
}

fn run_statement(conn: &Connection, sql: &str, params: &[SqlValue]) -> rusqlite::Result<QueryOutput> {
    let mut stmt = conn.prepare(sql)?;

    if stmt.column_count() == 0 {
        let affected = stmt.execute(params_from_iter(params.iter()))?;
        return Ok(QueryOutput::Inserted {
            insert_id: conn.last_insert_rowid(),
            affected_rows: affected as u64,
        });
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            record.insert(name.clone(), json_value(row.get_ref(idx)?));
        }
        out.push(record);
    }
    Ok(QueryOutput::Rows(out))
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
    }
}

fn poisoned() -> DataStoreError {
    DataStoreError::new("ER_CONNECTION_POISONED", 0, "connection lock poisoned")
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(SqliteValue::Null),
            SqlValue::Integer(i) => ToSqlOutput::from(*i),
            SqlValue::Real(f) => ToSqlOutput::from(*f),
            SqlValue::Text(s) => ToSqlOutput::from(s.as_str()),
            SqlValue::Blob(b) => ToSqlOutput::from(b.as_slice()),
        })
    }
}
