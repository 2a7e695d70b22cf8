//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::auth::require_auth;
use super::handlers::{
    delete_handler, get_handler, health_handler, pop_handler, push_handler, set_handler,
    snapshot_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST|PUT /set` - Store a JSON value with optional TTL
/// - `GET /get/:key` - Retrieve a value by key
/// - `DELETE /delete/:key` - Delete a key
/// - `POST /list/push` - Push a value onto a list
/// - `POST /list/pop/:key` - Pop the most recent value from a list
/// - `POST /snapshot` - Persist the store now
/// - `GET /stats` - Store statistics
/// - `GET /health` - Health check, never authenticated
///
/// # Middleware
/// - Auth: bearer token on every route except `/health`, when configured
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/set", post(set_handler).put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/delete/:key", delete(delete_handler))
        .route("/list/push", post(push_handler))
        .route("/list/pop/:key", post(pop_handler))
        .route("/snapshot", post(snapshot_handler))
        .route("/stats", get(stats_handler))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_auth,
        ));

    Router::new()
        .merge(protected)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
