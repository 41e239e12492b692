//! The three todo handlers and the contract they share.
//!
//! # Design
//! `TodoHandlers` owns only an injected `DataStore` handle and the error
//! detail policy. Each operation issues exactly one bound statement and maps
//! the outcome to an `HttpResponse`: 200 with data, or 500 with the store's
//! error. Handlers return a response on every path; nothing is propagated to
//! the host as a fault.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::ErrorDetail;
use crate::error::{ConfigError, DataStoreError};
use crate::http::{HttpEvent, HttpMethod, HttpResponse};
use crate::store::{DataStore, SqlValue};
use crate::types::{confirmation_message, NewTodo};

const SELECT_ALL: &str = "SELECT * FROM todos";
const SELECT_BY_ID: &str = "SELECT * FROM todos WHERE id = ?";

/// Path parameter carrying the todo id.
pub const TODO_ID_PARAM: &str = "todoId";

/// Which handler an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
}

impl Operation {
    /// Route an event by shape: POST creates, GET with a `todoId` fetches
    /// one, anything else lists.
    pub fn infer(event: &HttpEvent) -> Self {
        match event.http_method {
            HttpMethod::Post => Operation::Create,
            _ if event.path_param(TODO_ID_PARAM).is_some() => Operation::Get,
            _ => Operation::List,
        }
    }
}

impl FromStr for Operation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "list" | "findAll" => Ok(Operation::List),
            "get" | "findOne" => Ok(Operation::Get),
            "create" => Ok(Operation::Create),
            other => Err(ConfigError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List => write!(f, "list"),
            Operation::Get => write!(f, "get"),
            Operation::Create => write!(f, "create"),
        }
    }
}

/// Per-invocation metadata supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,

    /// Whether the host should wait for background work to drain before
    /// completing the invocation. Every handler clears it: the store handle
    /// outlives the invocation.
    pub wait_for_empty_event_loop: bool,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            wait_for_empty_event_loop: true,
        }
    }
}

/// List, fetch and create todos over an injected store.
#[derive(Clone)]
pub struct TodoHandlers {
    store: Arc<dyn DataStore>,
    error_detail: ErrorDetail,
}

impl TodoHandlers {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            store,
            error_detail: ErrorDetail::default(),
        }
    }

    pub fn with_error_detail(mut self, error_detail: ErrorDetail) -> Self {
        self.error_detail = error_detail;
        self
    }

    pub async fn handle(
        &self,
        operation: Operation,
        event: &HttpEvent,
        ctx: &mut InvocationContext,
    ) -> HttpResponse {
        match operation {
            Operation::List => self.list_todos(event, ctx).await,
            Operation::Get => self.get_todo(event, ctx).await,
            Operation::Create => self.create_todo(event, ctx).await,
        }
    }

    /// `SELECT * FROM todos` → `{"todos": [...]}`.
    pub async fn list_todos(&self, _event: &HttpEvent, ctx: &mut InvocationContext) -> HttpResponse {
        ctx.wait_for_empty_event_loop = false;
        info!(request_id = %ctx.request_id, operation = %Operation::List, "handling request");

        let result = self
            .store
            .execute(SELECT_ALL, &[])
            .await
            .map(|out| json!({ "todos": out.into_rows() }));
        self.respond(ctx, Operation::List, result)
    }

    /// Fetch by `todoId` → `{"todo": <row-or-null>}`. A missing row is still
    /// a 200.
    pub async fn get_todo(&self, event: &HttpEvent, ctx: &mut InvocationContext) -> HttpResponse {
        ctx.wait_for_empty_event_loop = false;
        let todo_id = event.path_param(TODO_ID_PARAM);
        info!(request_id = %ctx.request_id, operation = %Operation::Get, todo_id = ?todo_id, "handling request");

        let params = [SqlValue::from_path_param(todo_id)];
        let result = self.store.execute(SELECT_BY_ID, &params).await.map(|out| {
            let row = out.into_rows().into_iter().next();
            json!({ "todo": row })
        });
        self.respond(ctx, Operation::Get, result)
    }

    /// Insert the form's `todo` field → `{"res": "<confirmation with id>"}`.
    pub async fn create_todo(&self, event: &HttpEvent, ctx: &mut InvocationContext) -> HttpResponse {
        ctx.wait_for_empty_event_loop = false;
        info!(request_id = %ctx.request_id, operation = %Operation::Create, "handling request");

        let record = event
            .body_text()
            .map(|body| NewTodo::from_form(&body))
            .unwrap_or_default();
        let (sql, params) = record.to_insert().to_sql();

        let result = self
            .store
            .execute(&sql, &params)
            .await
            .and_then(|out| out.insert_id().ok_or_else(DataStoreError::missing_insert_id))
            .map(|id| json!({ "res": confirmation_message(id) }));
        self.respond(ctx, Operation::Create, result)
    }

    fn respond(
        &self,
        ctx: &InvocationContext,
        operation: Operation,
        result: Result<Value, DataStoreError>,
    ) -> HttpResponse {
        match result {
            Ok(body) => HttpResponse::json(200, &body),
            Err(err) => {
                error!(
                    request_id = %ctx.request_id,
                    operation = %operation,
                    code = %err.code,
                    error = %err,
                    "data store failure"
                );
                HttpResponse::json(500, &self.error_detail.render(&err))
            }
        }
    }
}

impl fmt::Debug for TodoHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoHandlers")
            .field("error_detail", &self.error_detail)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::store::{QueryOutput, Row};

    /// Replies with a fixed outcome and records every statement it sees.
    struct FakeStore {
        reply: Result<QueryOutput, DataStoreError>,
        seen: Mutex<Vec<(String, Vec<SqlValue>)>>,
    }

    impl FakeStore {
        fn replying(reply: Result<QueryOutput, DataStoreError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn statements(&self) -> Vec<(String, Vec<SqlValue>)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DataStore for FakeStore {
        async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<QueryOutput, DataStoreError> {
            self.seen.lock().unwrap().push((sql.to_string(), params.to_vec()));
            self.reply.clone()
        }
    }

    fn row(id: i64, todo: &str) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), id.into());
        row.insert("todo".to_string(), todo.into());
        row
    }

    fn failure() -> DataStoreError {
        DataStoreError::new("SQLITE_BUSY", 5, "database is locked")
    }

    fn ctx() -> InvocationContext {
        InvocationContext::new("req-1")
    }

    #[tokio::test]
    async fn list_wraps_rows_under_todos() {
        let store = FakeStore::replying(Ok(QueryOutput::Rows(vec![row(1, "a"), row(2, "b")])));
        let handlers = TodoHandlers::new(store.clone());
        let mut ctx = ctx();

        let resp = handlers.list_todos(&HttpEvent::default(), &mut ctx).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.json_body().unwrap(),
            json!({"todos": [{"id": 1, "todo": "a"}, {"id": 2, "todo": "b"}]})
        );
        assert_eq!(store.statements(), vec![(SELECT_ALL.to_string(), Vec::new())]);
        assert!(!ctx.wait_for_empty_event_loop);
    }

    #[tokio::test]
    async fn get_binds_todo_id() {
        let store = FakeStore::replying(Ok(QueryOutput::Rows(vec![row(7, "Buy milk")])));
        let handlers = TodoHandlers::new(store.clone());
        let event = HttpEvent::new(HttpMethod::Get, "/todos/7").with_path_param("todoId", "7");

        let resp = handlers.get_todo(&event, &mut ctx()).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.json_body().unwrap(),
            json!({"todo": {"id": 7, "todo": "Buy milk"}})
        );
        assert_eq!(
            store.statements(),
            vec![(SELECT_BY_ID.to_string(), vec![SqlValue::Integer(7)])]
        );
    }

    #[tokio::test]
    async fn get_without_match_is_200_with_null() {
        let store = FakeStore::replying(Ok(QueryOutput::Rows(Vec::new())));
        let handlers = TodoHandlers::new(store);
        let event = HttpEvent::new(HttpMethod::Get, "/todos/99").with_path_param("todoId", "99");

        let resp = handlers.get_todo(&event, &mut ctx()).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.json_body().unwrap(), json!({"todo": null}));
    }

    #[tokio::test]
    async fn get_without_path_param_binds_null() {
        let store = FakeStore::replying(Ok(QueryOutput::Rows(Vec::new())));
        let handlers = TodoHandlers::new(store.clone());

        let resp = handlers.get_todo(&HttpEvent::default(), &mut ctx()).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(store.statements()[0].1, vec![SqlValue::Null]);
    }

    #[tokio::test]
    async fn create_reports_inserted_id() {
        let store = FakeStore::replying(Ok(QueryOutput::Inserted {
            insert_id: 7,
            affected_rows: 1,
        }));
        let handlers = TodoHandlers::new(store.clone());
        let event = HttpEvent::new(HttpMethod::Post, "/todos").with_body("todo=Buy+milk&extra=x");
        let mut ctx = ctx();

        let resp = handlers.create_todo(&event, &mut ctx).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(
            resp.json_body().unwrap(),
            json!({"res": "Tarea insertada correctamente con id 7"})
        );
        assert_eq!(
            store.statements(),
            vec![(
                "INSERT INTO todos (todo) VALUES (?)".to_string(),
                vec![SqlValue::Text("Buy milk".to_string())]
            )]
        );
        assert!(!ctx.wait_for_empty_event_loop);
    }

    #[tokio::test]
    async fn create_without_body_binds_null() {
        let store = FakeStore::replying(Ok(QueryOutput::Inserted {
            insert_id: 1,
            affected_rows: 1,
        }));
        let handlers = TodoHandlers::new(store.clone());

        handlers
            .create_todo(&HttpEvent::new(HttpMethod::Post, "/todos"), &mut ctx())
            .await;

        assert_eq!(store.statements()[0].1, vec![SqlValue::Null]);
    }

    #[tokio::test]
    async fn create_without_insert_id_is_500() {
        let store = FakeStore::replying(Ok(QueryOutput::Rows(Vec::new())));
        let handlers = TodoHandlers::new(store);
        let event = HttpEvent::new(HttpMethod::Post, "/todos").with_body("todo=x");

        let resp = handlers.create_todo(&event, &mut ctx()).await;

        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.json_body().unwrap()["code"], "ER_NO_INSERT_ID");
    }

    #[tokio::test]
    async fn every_operation_maps_store_failure_to_500() {
        let store = FakeStore::replying(Err(failure()));
        let handlers = TodoHandlers::new(store);
        let event = HttpEvent::new(HttpMethod::Post, "/todos")
            .with_path_param("todoId", "1")
            .with_body("todo=x");

        for op in [Operation::List, Operation::Get, Operation::Create] {
            let mut ctx = ctx();
            let resp = handlers.handle(op, &event, &mut ctx).await;
            assert_eq!(resp.status_code, 500, "{op}");
            assert_eq!(
                resp.json_body().unwrap(),
                json!({"code": "SQLITE_BUSY", "errno": 5, "message": "database is locked"}),
                "{op}"
            );
            assert!(!ctx.wait_for_empty_event_loop, "{op}");
        }
    }

    #[tokio::test]
    async fn redacted_errors_hide_store_message() {
        let store = FakeStore::replying(Err(failure().with_sql(SELECT_ALL)));
        let handlers = TodoHandlers::new(store).with_error_detail(ErrorDetail::Redacted);

        let resp = handlers.list_todos(&HttpEvent::default(), &mut ctx()).await;

        assert_eq!(resp.status_code, 500);
        assert_eq!(
            resp.json_body().unwrap(),
            json!({"code": "SQLITE_BUSY", "message": "Internal server error"})
        );
    }

    #[test]
    fn operation_inferred_from_event_shape() {
        let list = HttpEvent::new(HttpMethod::Get, "/todos");
        let get = HttpEvent::new(HttpMethod::Get, "/todos/3").with_path_param("todoId", "3");
        let create = HttpEvent::new(HttpMethod::Post, "/todos");
        assert_eq!(Operation::infer(&list), Operation::List);
        assert_eq!(Operation::infer(&get), Operation::Get);
        assert_eq!(Operation::infer(&create), Operation::Create);
    }

    #[test]
    fn operation_parses_names_and_legacy_aliases() {
        assert_eq!("list".parse::<Operation>().unwrap(), Operation::List);
        assert_eq!("findAll".parse::<Operation>().unwrap(), Operation::List);
        assert_eq!("findOne".parse::<Operation>().unwrap(), Operation::Get);
        assert_eq!("create".parse::<Operation>().unwrap(), Operation::Create);
        assert!(matches!(
            "delete".parse::<Operation>(),
            Err(ConfigError::UnknownOperation(_))
        ));
    }
}
