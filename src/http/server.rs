//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the host router with the config interceptor
//! - Wire up request tracing
//! - Bind to a listener and shut down gracefully

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::trace::TraceLayer;

use crate::http::interceptor::{ConfigHandle, ConfigLayer};

/// Serves a host router with `/config/` intercepted.
pub struct HttpServer {
    router: Router,
    handle: ConfigHandle,
}

impl HttpServer {
    /// Wrap `host` with `layer`.
    pub fn new(layer: ConfigLayer, host: Router) -> Self {
        let handle = layer.handle();
        let router = Self::build_router(&layer, host);
        Self { router, handle }
    }

    fn build_router(layer: &ConfigLayer, host: Router) -> Router {
        Router::new()
            .fallback_service(layer.layer(host))
            .layer(TraceLayer::new_for_http())
    }

    pub fn handle(&self) -> &ConfigHandle {
        &self.handle
    }

    /// The composed router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run until `shutdown` completes.
    pub async fn run_until<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
