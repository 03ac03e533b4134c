//! `configurable` server.
//!
//! Serves a small host application with the configuration store mounted at
//! `/config/`.
//!
//! ```text
//! configurable --file app.yml --format yml --bind 127.0.0.1:8080 --watch
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clap::Parser;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use configurable::config::{ConfigStore, ConfigWatcher};
use configurable::http::{ConfigHandle, ConfigLayer, HttpServer};
use configurable::observability::metrics;

#[derive(Parser)]
#[command(name = "configurable")]
#[command(about = "Serve a live configuration store over HTTP", long_about = None)]
struct Cli {
    /// Configuration file to load from and save to
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Format of the file: yml, yaml, json or toml
    #[arg(long, default_value = "yml")]
    format: String,

    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Reload the file when it changes on disk
    #[arg(long)]
    watch: bool,

    /// Expose Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "configurable=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    tracing::info!("configurable v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr);
    }

    let mut builder = ConfigStore::builder();
    if let Some(path) = &cli.file {
        builder = builder.file(path, &cli.format);
    }
    let store = Arc::new(builder.build());

    tracing::info!(
        file = ?cli.file,
        format = %cli.format,
        keys = store.len(),
        "Configuration loaded"
    );

    let _watcher = if cli.watch {
        Some(ConfigWatcher::new(store.clone()).run()?)
    } else {
        None
    };

    let host_settings = Arc::new(HashMap::from([
        ("name".to_string(), Value::from("configurable")),
        ("version".to_string(), Value::from(env!("CARGO_PKG_VERSION"))),
    ]));
    let layer = ConfigLayer::new(store).host_settings(&host_settings);
    let host = host_router(layer.handle());

    let listener = TcpListener::bind(&cli.bind).await?;
    HttpServer::new(layer, host).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn host_router(handle: ConfigHandle) -> Router {
    Router::new()
        .route("/", get(|| async { "configurable" }))
        .route("/settings/{key}", get(get_setting))
        .with_state(handle)
}

async fn get_setting(
    State(handle): State<ConfigHandle>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match handle.at(&key) {
        Ok(value) => Json(value).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}
