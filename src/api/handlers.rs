//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::api::AuthConfig;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, HealthResponse, PushRequest, PushResponse, SetRequest, SetResponse,
    SnapshotResponse, StatsResponse, ValueResponse,
};
use crate::persistence::{self, PersistenceError, SnapshotBackend};
use crate::store::{ShardedStore, Value};

/// Application state shared across all handlers.
///
/// The store synchronizes itself per shard, so handlers share it through a
/// plain `Arc` without an outer lock.
#[derive(Clone)]
pub struct AppState {
    /// Shared sharded store
    pub store: Arc<ShardedStore>,
    /// Snapshot backend, None when persistence is disabled
    pub backend: Option<Arc<dyn SnapshotBackend>>,
    /// Authentication settings for protected routes
    pub auth: AuthConfig,
}

impl AppState {
    /// Creates a new AppState around `store` with persistence and auth disabled.
    pub fn new(store: ShardedStore) -> Self {
        Self {
            store: Arc::new(store),
            backend: None,
            auth: AuthConfig::disabled(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn SnapshotBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the store with the configured shard count and opens the
    /// configured persistence backend. The store is not hydrated here.
    pub fn from_config(config: &Config) -> std::result::Result<Self, PersistenceError> {
        let state = Self::new(ShardedStore::with_shard_count(config.shard_count))
            .with_auth(AuthConfig::from_config(config));

        Ok(match persistence::open_backend(&config.persistence())? {
            Some(backend) => state.with_backend(backend),
            None => state,
        })
    }
}

/// Handler for POST|PUT /set
///
/// Stores any JSON value at a key with an optional TTL in seconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    state
        .store
        .set(req.key.as_str(), Value::Scalar(req.value), req.ttl)?;
    debug!(key = %req.key, ttl = req.ttl, "key set");

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Lists are returned as JSON arrays, oldest item first.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>> {
    let value = state
        .store
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(ValueResponse::new(key, value.into_json())))
}

/// Handler for DELETE /delete/:key
///
/// Always succeeds; `existed` reports whether anything was removed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let existed = state.store.delete(&key);
    debug!(%key, existed, "key deleted");

    Json(DeleteResponse::new(key, existed))
}

/// Handler for POST /list/push
pub async fn push_handler(
    State(state): State<AppState>,
    Json(req): Json<PushRequest>,
) -> Result<Json<PushResponse>> {
    let length = state.store.push(&req.key, req.value)?;
    Ok(Json(PushResponse::new(req.key, length)))
}

/// Handler for POST /list/pop/:key
///
/// Returns 404 when the list is empty.
pub async fn pop_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>> {
    let value = state
        .store
        .pop(&key)?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(ValueResponse::new(key, value)))
}

/// Handler for POST /snapshot
///
/// Saves the store through the configured backend right away.
pub async fn snapshot_handler(State(state): State<AppState>) -> Result<Json<SnapshotResponse>> {
    let backend = state
        .backend
        .as_deref()
        .ok_or_else(|| CacheError::InvalidRequest("Persistence is disabled".to_string()))?;

    let entries = persistence::persist(&state.store, backend).await?;
    Ok(Json(SnapshotResponse::new(backend.name(), entries)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.store.stats();
    Json(StatsResponse::new(&stats, state.store.shard_count()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
