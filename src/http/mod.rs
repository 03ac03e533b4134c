//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing, graceful shutdown)
//!     → interceptor.rs (ConfigService)
//!         /config/ (GET, HEAD) → JSON snapshot of the store
//!         anything else        → host's service, unchanged
//! ```

pub mod interceptor;
pub mod server;

pub use interceptor::{
    is_config_request, ConfigHandle, ConfigLayer, ConfigService, CONFIG_PATH_PREFIX,
};
pub use server::HttpServer;
