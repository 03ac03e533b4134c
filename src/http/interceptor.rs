//! Config-serving wrapper around a host's request handler.
//!
//! # Responsibilities
//! - Answer `GET`/`HEAD` requests under `/config/` with a JSON snapshot
//! - Forward every other request to the wrapped service untouched
//! - Hand the host a [`ConfigHandle`] for keyed reads and writes
//!
//! # Design Decisions
//! - Composition through a `tower::Layer`; the host installs it explicitly
//! - Pass-through returns the inner future as-is, no boxing
//! - The snapshot is encoded under the store's read guard

use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use axum::{
    http::{header, Method, Request},
    response::{IntoResponse, Response},
};
use futures_util::future::{self, Either, Ready};
use serde_json::{Map, Value};
use tower::{Layer, Service};

use crate::config::{ChangeSet, ConfigStore, Fallback, StoreError};
use crate::observability::metrics;

/// Path prefix served by the interceptor.
pub const CONFIG_PATH_PREFIX: &str = "/config/";

/// Whether the interceptor answers this request itself.
pub fn is_config_request<B>(request: &Request<B>) -> bool {
    (request.method() == Method::GET || request.method() == Method::HEAD)
        && request.uri().path().starts_with(CONFIG_PATH_PREFIX)
}

/// Shared access to the store for host code, with the host's original
/// settings as a last resort on reads.
#[derive(Clone)]
pub struct ConfigHandle {
    store: Arc<ConfigStore>,
    host_settings: Option<Weak<dyn Fallback>>,
}

impl ConfigHandle {
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Keyed read: the store, then the host settings captured at wrap time,
    /// then the store's own fallback.
    pub fn at(&self, key: &str) -> Result<Value, StoreError> {
        if let Some(value) = self.store.lookup(key) {
            return Ok(value);
        }
        let from_host = self
            .host_settings
            .as_ref()
            .and_then(Weak::upgrade)
            .and_then(|settings| settings.lookup(key));
        match from_host {
            Some(value) => Ok(value),
            None => self.store.at(key),
        }
    }

    pub fn get(&self, key: &str, default: Value) -> Value {
        self.store.get(key, default)
    }

    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.store.set(key, value)
    }

    pub fn merge_into(&self, incoming: &Map<String, Value>) -> ChangeSet {
        self.store.merge_into(incoming)
    }

    /// The body `/config/` responds with.
    pub fn snapshot_response(&self) -> Response {
        metrics::record_snapshot_served();
        (
            [(header::CONTENT_TYPE, "application/json")],
            self.store.to_json(),
        )
            .into_response()
    }
}

impl std::fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("store", &self.store)
            .field("has_host_settings", &self.host_settings.is_some())
            .finish()
    }
}

/// Layer producing [`ConfigService`].
#[derive(Clone, Debug)]
pub struct ConfigLayer {
    handle: ConfigHandle,
}

impl ConfigLayer {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self {
            handle: ConfigHandle {
                store,
                host_settings: None,
            },
        }
    }

    /// Capture the host's pre-existing settings for keyed-read fallback.
    pub fn host_settings<F: Fallback + 'static>(mut self, settings: &Arc<F>) -> Self {
        let weak: Weak<dyn Fallback> = Arc::downgrade(settings) as Weak<dyn Fallback>;
        self.handle.host_settings = Some(weak);
        self
    }

    /// Handle to give to the host's own handlers.
    pub fn handle(&self) -> ConfigHandle {
        self.handle.clone()
    }
}

impl<S> Layer<S> for ConfigLayer {
    type Service = ConfigService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ConfigService {
            inner,
            handle: self.handle.clone(),
        }
    }
}

/// Serves `/config/` and forwards everything else to `S`.
#[derive(Clone, Debug)]
pub struct ConfigService<S> {
    inner: S,
    handle: ConfigHandle,
}

impl<S> ConfigService<S> {
    pub fn handle(&self) -> &ConfigHandle {
        &self.handle
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, B> Service<Request<B>> for ConfigService<S>
where
    S: Service<Request<B>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        if is_config_request(&request) {
            tracing::debug!(
                path = %request.uri().path(),
                "Saw config in the path, serving snapshot"
            );
            return Either::Left(future::ready(Ok(self.handle.snapshot_response())));
        }
        Either::Right(self.inner.call(request))
    }
}
