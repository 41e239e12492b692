//! Error types for the todo handlers.
//!
//! # Design
//! Handlers distinguish exactly one failure kind: whatever the data store
//! reports while executing a statement. `DataStoreError` keeps the store's
//! code, numeric error number and message so the 500 body can carry them
//! verbatim (or redacted, see `ErrorDetail`). `ConfigError` only surfaces at
//! process start-up and never reaches a handler response.

use serde::Serialize;
use thiserror::Error;

/// A failure reported by the data store while executing a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{code} ({errno}): {message}")]
pub struct DataStoreError {
    /// Symbolic error code, e.g. `SQLITE_CONSTRAINT`.
    pub code: String,

    /// Numeric error number as reported by the store (extended code for SQLite).
    pub errno: i32,

    /// Human-readable message from the store.
    pub message: String,

    /// Statement that failed, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl DataStoreError {
    pub fn new(code: impl Into<String>, errno: i32, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            errno,
            message: message.into(),
            sql: None,
        }
    }

    pub fn with_sql(mut self, sql: &str) -> Self {
        self.sql = Some(sql.to_string());
        self
    }

    /// The store accepted a write but did not report the generated id.
    pub fn missing_insert_id() -> Self {
        Self::new("ER_NO_INSERT_ID", 0, "store did not report an inserted id")
    }
}

impl From<rusqlite::Error> for DataStoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, message) => Self::new(
                sqlite_code_name(inner.code),
                inner.extended_code,
                message.clone().unwrap_or_else(|| err.to_string()),
            ),
            _ => Self::new("SQLITE_MISUSE", 21, err.to_string()),
        }
    }
}

fn sqlite_code_name(code: rusqlite::ErrorCode) -> &'static str {
    use rusqlite::ErrorCode;

    match code {
        ErrorCode::ConstraintViolation => "SQLITE_CONSTRAINT",
        ErrorCode::DatabaseBusy => "SQLITE_BUSY",
        ErrorCode::DatabaseLocked => "SQLITE_LOCKED",
        ErrorCode::ReadOnly => "SQLITE_READONLY",
        ErrorCode::CannotOpen => "SQLITE_CANTOPEN",
        ErrorCode::TypeMismatch => "SQLITE_MISMATCH",
        ErrorCode::TooBig => "SQLITE_TOOBIG",
        ErrorCode::DiskFull => "SQLITE_FULL",
        ErrorCode::SystemIoFailure => "SQLITE_IOERR",
        ErrorCode::DatabaseCorrupt => "SQLITE_CORRUPT",
        _ => "SQLITE_ERROR",
    }
}

/// Invalid process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("unknown operation {0:?}, expected list, get or create")]
    UnknownOperation(String),
}
