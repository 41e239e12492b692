use std::sync::Arc;

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use todo_handlers::{Config, TodoHandlers};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    // Opened once per execution environment and reused by every invocation.
    let store = config.open_store()?;
    let handlers = Arc::new(TodoHandlers::new(Arc::new(store)).with_error_detail(config.error_detail));
    let pinned = config.operation;

    info!(database = %config.database, operation = ?pinned, "todo handlers starting");

    run(service_fn(move |event: LambdaEvent<ApiGatewayProxyRequest>| {
        let handlers = Arc::clone(&handlers);
        async move { Ok::<_, Error>(todo_lambda::invoke(&handlers, pinned, event).await) }
    }))
    .await
}
