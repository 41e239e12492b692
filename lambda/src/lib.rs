//! Lambda entry point for the todo handlers.
//!
//! Converts API gateway proxy requests into `HttpEvent`s and handler
//! responses back into proxy responses. The operation is either pinned by
//! configuration (one function per handler) or inferred per event.

use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use http::{HeaderMap, HeaderName, HeaderValue};
use lambda_runtime::LambdaEvent;
use todo_handlers::{HttpEvent, HttpMethod, HttpResponse, InvocationContext, Operation, TodoHandlers};
use tracing::debug;

pub fn event_from_proxy(request: ApiGatewayProxyRequest) -> HttpEvent {
    let path_parameters =
        (!request.path_parameters.is_empty()).then_some(request.path_parameters);
    HttpEvent {
        http_method: HttpMethod::from(request.http_method.as_str()),
        path: request.path.unwrap_or_default(),
        path_parameters,
        body: request.body,
        is_base64_encoded: request.is_base64_encoded,
    }
}

pub fn proxy_from_response(response: HttpResponse) -> ApiGatewayProxyResponse {
    let mut headers = HeaderMap::new();
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            headers.insert(name, value);
        }
    }
    ApiGatewayProxyResponse {
        status_code: i64::from(response.status_code),
        headers,
        multi_value_headers: HeaderMap::new(),
        body: Some(Body::Text(response.body)),
        is_base64_encoded: false,
    }
}

/// Run one invocation. Always yields a response; store failures are already
/// shaped into 500s by the handlers.
pub async fn invoke(
    handlers: &TodoHandlers,
    pinned: Option<Operation>,
    event: LambdaEvent<ApiGatewayProxyRequest>,
) -> ApiGatewayProxyResponse {
    let (request, context) = event.into_parts();
    let event = event_from_proxy(request);
    let operation = pinned.unwrap_or_else(|| Operation::infer(&event));

    let mut ctx = InvocationContext::new(context.request_id);
    let response = handlers.handle(operation, &event, &mut ctx).await;
    debug!(
        request_id = %ctx.request_id,
        operation = %operation,
        status = response.status_code,
        wait_for_empty_event_loop = ctx.wait_for_empty_event_loop,
        "invocation complete"
    );
    proxy_from_response(response)
}
