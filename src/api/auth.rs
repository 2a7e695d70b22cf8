//! Bearer token authentication
//!
//! When a token is configured every protected route requires
//! `Authorization: Bearer <token>`. Without a token authentication is disabled.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::config::Config;
use crate::error::{CacheError, Result};

/// Authentication settings, built once from [`Config`] and handed to the router.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    token: Option<Arc<str>>,
}

impl AuthConfig {
    /// Accepts every request.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Requires the given bearer token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(Arc::from(token.into())),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        config
            .auth_token
            .as_deref()
            .map(Self::bearer)
            .unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Checks an `Authorization` header value against the configured token.
    ///
    /// The header must use the `Bearer` scheme.
    pub fn authorize(&self, header: Option<&str>) -> Result<()> {
        let Some(expected) = &self.token else {
            return Ok(());
        };

        let provided = header
            .ok_or_else(|| CacheError::Unauthorized("Missing token".to_string()))?
            .strip_prefix("Bearer ")
            .ok_or_else(|| CacheError::Unauthorized("Expected a Bearer token".to_string()))?
            .trim();

        if constant_time_compare(provided, expected) {
            Ok(())
        } else {
            Err(CacheError::Unauthorized("Invalid token".to_string()))
        }
    }
}

// Length is not secret; only the contents are compared in constant time.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Middleware rejecting requests that fail [`AuthConfig::authorize`].
pub async fn require_auth(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if let Err(e) = auth.authorize(header) {
        warn!(path = %request.uri().path(), error = %e, "rejected unauthenticated request");
        return Err(e);
    }

    Ok(next.run(request).await)
}
