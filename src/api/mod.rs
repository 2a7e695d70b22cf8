//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `POST|PUT /set` - Store a JSON value
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /delete/:key` - Delete a key
//! - `POST /list/push` - Push onto a list
//! - `POST /list/pop/:key` - Pop from a list
//! - `POST /snapshot` - Persist the store now
//! - `GET /stats` - Store statistics
//! - `GET /health` - Health check endpoint

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::AuthConfig;
pub use handlers::*;
pub use routes::create_router;
