//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use configurable::config::ConfigStore;
use configurable::http::{ConfigHandle, ConfigLayer, HttpServer};

/// Mapping used across the integration tests.
#[allow(dead_code)]
pub fn sample_config() -> Map<String, Value> {
    into_map(json!({
        "application": {"debug": false, "commit": "something"},
        "mysql": {"host": 12345, "words": ["a", "b", "c"]}
    }))
}

pub fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not a mapping: {other}"),
    }
}

/// Host app standing in for an existing service.
///
/// `/settings/{key}` reads through the handle, like a host using the store
/// in place of its own settings.
#[allow(dead_code)]
pub fn host_app(handle: ConfigHandle) -> Router {
    Router::new()
        .route("/hello", get(|| async { "hello" }))
        .route("/config", get(|| async { "host owns /config" }))
        .route("/settings/{key}", get(get_setting))
        .with_state(handle)
}

#[allow(dead_code)]
async fn get_setting(
    State(handle): State<ConfigHandle>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match handle.at(&key) {
        Ok(value) => Json(value).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

/// Settings the host had before the store was attached.
#[allow(dead_code)]
pub fn host_settings() -> HashMap<String, Value> {
    HashMap::from([
        ("DEBUG".to_string(), json!(true)),
        ("a".to_string(), json!("host value")),
    ])
}

/// Start the composed server on an ephemeral port.
///
/// Dropping the returned sender shuts the server down.
#[allow(dead_code)]
pub async fn start_server(store: Arc<ConfigStore>) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let settings = Arc::new(host_settings());
    let layer = ConfigLayer::new(store).host_settings(&settings);
    let server = HttpServer::new(layer.clone(), host_app(layer.handle()));
    tokio::spawn(async move {
        // keeps the weakly held host settings alive for the server's lifetime
        let _settings = settings;
        let _ = server
            .run_until(listener, async move {
                let _ = rx.await;
            })
            .await;
    });

    (addr, tx)
}
