//! The data-store seam consumed by the handlers.
//!
//! # Design
//! Handlers see the database through one operation, `DataStore::execute`,
//! which takes a SQL template plus positional bound parameters and yields
//! either result rows or a write summary. The connection handle behind it is
//! opened once per process and shared across invocations; the adapter never
//! opens or closes it.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::DataStoreError;

pub mod sqlite;

pub use sqlite::{SqliteStore, SCHEMA};

/// A result row: column name to JSON value, in column order.
pub type Row = Map<String, Value>;

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Bind a raw path parameter. Integers bind as integers; any other text
    /// passes through unchanged for the store to compare.
    pub fn from_path_param(raw: Option<&str>) -> Self {
        match raw {
            None => SqlValue::Null,
            Some(text) => text
                .parse::<i64>()
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(text.to_string())),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// What a statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<Row>),
    Inserted { insert_id: i64, affected_rows: u64 },
}

impl QueryOutput {
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryOutput::Rows(rows) => rows,
            QueryOutput::Inserted { .. } => Vec::new(),
        }
    }

    pub fn insert_id(&self) -> Option<i64> {
        match self {
            QueryOutput::Inserted { insert_id, .. } => Some(*insert_id),
            QueryOutput::Rows(_) => None,
        }
    }
}

/// Executes one parameterized statement against the backing database.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryOutput, DataStoreError>;
}

/// "Insert a row with these column values", rendered to a parameterized
/// statement so values are always bound, never spliced.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    table: String,
    columns: Vec<(String, SqlValue)>,
}

impl Insert {
    pub fn into_table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn value(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.columns.push((column.to_string(), value.into()));
        self
    }

    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        if self.columns.is_empty() {
            return (format!("INSERT INTO {} DEFAULT VALUES", self.table), Vec::new());
        }
        let names: Vec<&str> = self.columns.iter().map(|(name, _)| name.as_str()).collect();
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            placeholders
        );
        let params = self.columns.iter().map(|(_, value)| value.clone()).collect();
        (sql, params)
    }
}
