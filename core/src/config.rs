//! Process configuration read once at start-up.
//!
//! Values come from the environment. The store handle built here is the one
//! shared across every invocation the process serves.

use std::str::FromStr;

use serde_json::{json, Value};

use crate::error::{ConfigError, DataStoreError};
use crate::handler::Operation;
use crate::store::SqliteStore;

pub const ENV_DATABASE: &str = "TODOS_DATABASE";
pub const ENV_ERROR_DETAIL: &str = "TODOS_ERROR_DETAIL";
pub const ENV_INIT_SCHEMA: &str = "TODOS_INIT_SCHEMA";
pub const ENV_HANDLER: &str = "TODOS_HANDLER";

pub const DEFAULT_DATABASE: &str = "todos.db";

/// How much of a `DataStoreError` crosses into a 500 body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorDetail {
    /// The serialized error, verbatim.
    #[default]
    Full,
    /// Only the error code and a generic message.
    Redacted,
}

impl ErrorDetail {
    pub fn render(&self, err: &DataStoreError) -> Value {
        match self {
            ErrorDetail::Full => json!(err),
            ErrorDetail::Redacted => json!({
                "code": err.code,
                "message": "Internal server error",
            }),
        }
    }
}

impl FromStr for ErrorDetail {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(ErrorDetail::Full),
            "redacted" => Ok(ErrorDetail::Redacted),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_ERROR_DETAIL,
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite path, or `:memory:`.
    pub database: String,
    pub error_detail: ErrorDetail,
    /// Create the `todos` table at start-up when missing.
    pub init_schema: bool,
    /// Pin every invocation to one operation; `None` infers it per event.
    pub operation: Option<Operation>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            error_detail: ErrorDetail::default(),
            init_schema: false,
            operation: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(database) = lookup(ENV_DATABASE).filter(|v| !v.trim().is_empty()) {
            config.database = database;
        }
        if let Some(detail) = lookup(ENV_ERROR_DETAIL) {
            config.error_detail = detail.parse()?;
        }
        if let Some(flag) = lookup(ENV_INIT_SCHEMA) {
            config.init_schema = parse_flag(ENV_INIT_SCHEMA, &flag)?;
        }
        if let Some(handler) = lookup(ENV_HANDLER).filter(|v| !v.trim().is_empty()) {
            config.operation = Some(handler.parse()?);
        }
        Ok(config)
    }

    /// Open the shared store handle.
    pub fn open_store(&self) -> Result<SqliteStore, DataStoreError> {
        let store = if self.database == ":memory:" {
            SqliteStore::open_in_memory()?
        } else {
            SqliteStore::open(&self.database)?
        };
        if self.init_schema {
            store.init_schema()?;
        }
        Ok(store)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
