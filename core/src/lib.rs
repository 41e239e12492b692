//! Serverless todo handlers over a single `todos` table.
//!
//! # Overview
//! Three handlers (list, fetch by id, create) each take an HTTP-shaped
//! event, issue one parameterized SQL statement through an injected
//! `DataStore`, and shape the outcome into an HTTP-shaped response.
//!
//! # Design
//! - `TodoHandlers` holds only the shared store handle; it carries no state
//!   between invocations.
//! - Every failure the store reports becomes a 500 whose body is the
//!   serialized `DataStoreError`; handlers never return an error to the host.
//! - Writes take `application/x-www-form-urlencoded` bodies while every
//!   response is JSON. The asymmetry is part of the public contract.
//! - Hosts (the local gateway, the lambda binary) own transport and process
//!   lifecycle and are kept out of this crate.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod store;
pub mod types;

pub use config::{Config, ErrorDetail};
pub use error::{ConfigError, DataStoreError};
pub use handler::{InvocationContext, Operation, TodoHandlers, TODO_ID_PARAM};
pub use http::{HttpEvent, HttpMethod, HttpResponse};
pub use store::{DataStore, Insert, QueryOutput, Row, SqlValue, SqliteStore, SCHEMA};
pub use types::{confirmation_message, NewTodo, Todo, TODOS_TABLE};
