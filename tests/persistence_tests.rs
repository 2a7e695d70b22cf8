//! Integration Tests for Persistence
//!
//! Covers restart cycles through both backends and one end-to-end run over a
//! real socket.

use std::sync::Arc;

use serde_json::json;
use shard_cache::persistence::{self, FileBackend, SnapshotBackend, SqliteBackend};
use shard_cache::{
    api::create_router, AppState, CacheClient, ClientError, Config, ShardedStore, Value,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_file_restart_cycle() {
    let dir = TempDir::new().unwrap();
    let backend = FileBackend::new(dir.path().join("data.json"));

    let store = ShardedStore::new();
    store.set("x", Value::scalar("y"), 0).unwrap();
    store.set("session", Value::scalar(json!({"user": 1})), 3600).unwrap();
    store.push("jobs", json!("first")).unwrap();
    store.push("jobs", json!("second")).unwrap();
    persistence::persist(&store, &backend).await.unwrap();

    // A store of a different size restores correctly because keys are rerouted
    let restarted = ShardedStore::with_shard_count(7);
    assert_eq!(persistence::hydrate(&restarted, &backend).await, 3);

    assert_eq!(restarted.get("x"), Some(Value::scalar("y")));
    assert_eq!(restarted.get("session"), Some(Value::scalar(json!({"user": 1}))));
    assert_eq!(restarted.pop("jobs").unwrap(), Some(json!("second")));
    assert_eq!(restarted.pop("jobs").unwrap(), Some(json!("first")));
}

#[tokio::test]
async fn test_sqlite_restart_cycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");

    let store = ShardedStore::new();
    store.set("a", Value::scalar(1), 0).unwrap();
    store.set("b", Value::scalar("two"), 0).unwrap();
    store.delete("a");
    persistence::persist(&store, &SqliteBackend::open(&path, 86_400).unwrap())
        .await
        .unwrap();

    let restarted = ShardedStore::new();
    let backend = SqliteBackend::open(&path, 86_400).unwrap();
    assert_eq!(persistence::hydrate(&restarted, &backend).await, 1);
    assert_eq!(restarted.get("a"), None);
    assert_eq!(restarted.get("b"), Some(Value::scalar("two")));
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    tokio::fs::write(&path, b"[1, 2, 3]").await.unwrap();

    let store = ShardedStore::new();
    assert_eq!(persistence::hydrate(&store, &FileBackend::new(&path)).await, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_end_to_end_over_socket() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        enable_persistence: true,
        snapshot_path: dir.path().join("data.json"),
        auth_token: Some("e2e-token".to_string()),
        ..Config::default()
    };
    let state = AppState::from_config(&config).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state.clone());
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base = format!("http://{}", addr);

    let anonymous = CacheClient::new(&base).unwrap();
    let err = anonymous
        .set("greeting", json!("hello"), 60)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Status { status, .. } if status == reqwest::StatusCode::UNAUTHORIZED
    ));

    let client = CacheClient::new(&base).unwrap().with_token("e2e-token");
    client.set("greeting", json!("hello"), 60).await.unwrap();
    assert_eq!(client.get("greeting").await.unwrap(), Some(json!("hello")));
    assert_eq!(client.push("jobs", json!("build")).await.unwrap(), 1);

    assert_eq!(client.snapshot().await.unwrap(), 2);

    server.abort();

    let backend: Arc<dyn SnapshotBackend> = state.backend.clone().unwrap();
    let snapshot = backend.load().await.unwrap();
    assert_eq!(snapshot["greeting"].value, Value::scalar("hello"));
    assert!(snapshot["greeting"].expires_at.is_some());
    assert_eq!(snapshot["jobs"].value.detached().into_json(), json!(["build"]));
}

#[test]
fn test_blocking_hydrate_with_tokio_test() {
    let dir = TempDir::new().unwrap();
    let backend = FileBackend::new(dir.path().join("data.json"));

    let store = ShardedStore::new();
    store.set("k", Value::scalar("v"), 0).unwrap();
    tokio_test::block_on(persistence::persist(&store, &backend)).unwrap();

    let fresh = ShardedStore::new();
    assert_eq!(tokio_test::block_on(persistence::hydrate(&fresh, &backend)), 1);
    assert_eq!(fresh.get("k"), Some(Value::scalar("v")));
}
