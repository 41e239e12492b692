use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use todo_handlers::{Config, ErrorDetail, TodoHandlers};
use tokio::net::TcpListener;
use tracing::info;

/// Serve the todo handlers on a local port.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// SQLite database path, or `:memory:`.
    #[arg(long, env = "TODOS_DATABASE", default_value = todo_handlers::config::DEFAULT_DATABASE)]
    database: String,

    /// `full` or `redacted`.
    #[arg(long, env = "TODOS_ERROR_DETAIL", default_value = "full")]
    error_detail: ErrorDetail,

    /// Create the todos table when missing.
    #[arg(long, env = "TODOS_INIT_SCHEMA")]
    init_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config {
        database: args.database,
        error_detail: args.error_detail,
        init_schema: args.init_schema,
        operation: None,
    };

    let store = config
        .open_store()
        .with_context(|| format!("opening database {}", config.database))?;
    let handlers = TodoHandlers::new(Arc::new(store)).with_error_detail(config.error_detail);

    let addr = format!("127.0.0.1:{}", args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, database = %config.database, "listening");
    todo_gateway::run(listener, handlers).await?;
    Ok(())
}
