//! Local API gateway for the todo handlers.
//!
//! Each route turns the incoming request into an `HttpEvent`, invokes the
//! matching handler with a fresh `InvocationContext`, and writes the
//! handler's `HttpResponse` back verbatim.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use todo_handlers::{HttpEvent, HttpMethod, HttpResponse, InvocationContext, Operation, TodoHandlers};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::debug;
use uuid::Uuid;

pub type Handlers = Arc<TodoHandlers>;

pub fn app(handlers: TodoHandlers) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{todoId}", get(get_todo))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(handlers))
}

pub async fn run(listener: TcpListener, handlers: TodoHandlers) -> Result<(), std::io::Error> {
    axum::serve(listener, app(handlers)).await
}

async fn list_todos(State(handlers): State<Handlers>, method: Method, uri: Uri) -> Response {
    let event = HttpEvent::new(HttpMethod::from(method.as_str()), uri.path());
    dispatch(&handlers, Operation::List, event).await
}

async fn get_todo(
    State(handlers): State<Handlers>,
    method: Method,
    uri: Uri,
    Path(params): Path<HashMap<String, String>>,
) -> Response {
    let mut event = HttpEvent::new(HttpMethod::from(method.as_str()), uri.path());
    for (name, value) in &params {
        event = event.with_path_param(name, value);
    }
    dispatch(&handlers, Operation::Get, event).await
}

async fn create_todo(State(handlers): State<Handlers>, method: Method, uri: Uri, body: Bytes) -> Response {
    let event = HttpEvent::new(HttpMethod::from(method.as_str()), uri.path())
        .with_body(&String::from_utf8_lossy(&body));
    dispatch(&handlers, Operation::Create, event).await
}

async fn dispatch(handlers: &TodoHandlers, operation: Operation, event: HttpEvent) -> Response {
    let mut ctx = InvocationContext::new(Uuid::new_v4().to_string());
    let response = handlers.handle(operation, &event, &mut ctx).await;
    debug!(
        request_id = %ctx.request_id,
        status = response.status_code,
        wait_for_empty_event_loop = ctx.wait_for_empty_event_loop,
        "invocation complete"
    );
    into_axum(response)
}

/// Copy status, headers and body of a handler response onto an axum one.
/// Headers that are not valid HTTP are skipped.
pub fn into_axum(response: HttpResponse) -> Response {
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut out = (status, response.body).into_response();
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            out.headers_mut().insert(name, value);
        }
    }
    out
}
