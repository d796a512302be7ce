//! HTTP application: shared state, per-request storage scope and the router

use crate::api::{self, ApiError};
use crate::error::StorageError;
use crate::storage::Storage;
use crate::web;
use axum::Router;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Shared application state: the storage handle built once at startup
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<Box<dyn Storage>>>,
}

impl AppState {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Begin a request scope. The scope is closed when the guard drops.
    pub fn session(&self) -> Result<StorageSession<'_>, StorageError> {
        let guard = self.storage.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(StorageSession { guard })
    }
}

/// Exclusive access to storage for the length of one request
pub struct StorageSession<'a> {
    guard: MutexGuard<'a, Box<dyn Storage>>,
}

impl Deref for StorageSession<'_> {
    type Target = dyn Storage;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for StorageSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}

impl Drop for StorageSession<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.guard.close() {
            tracing::warn!(error = %e, "failed to close storage session");
        }
    }
}

/// REST API under `/api/v1`, HTML pages at the root.
///
/// Trailing slashes are trimmed before routing, so `/api/v1/states/` and
/// `/api/v1/states` reach the same handler.
pub fn app(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .nest("/api/v1", api::router())
        .merge(web::router())
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
