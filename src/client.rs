//! HTTP client for the cache server
//!
//! Typed wrapper over the REST API. Absent keys and empty lists come back as
//! `None`; every other non-success status is a [`ClientError::Status`].

use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

use crate::models::{
    DeleteResponse, ErrorResponse, HealthResponse, PushRequest, PushResponse, SetRequest,
    SetResponse, SnapshotResponse, StatsResponse, ValueResponse,
};

/// Errors returned by [`CacheClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL cannot be parsed or cannot carry path segments
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    /// The request could not be sent or the body could not be decoded
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },
}

/// Client for one cache server.
#[derive(Debug, Clone)]
pub struct CacheClient {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl CacheClient {
    /// Creates a client for the server at `base_url`, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Stores `value` at `key`; a `ttl` of 0 never expires.
    pub async fn set(&self, key: &str, value: JsonValue, ttl: u64) -> Result<(), ClientError> {
        let body = SetRequest {
            key: key.to_string(),
            value,
            ttl,
        };
        let _: SetResponse = self.send(self.http.post(self.url(&["set"])?).json(&body)).await?;
        Ok(())
    }

    /// Reads `key`. Lists come back as arrays, oldest first.
    pub async fn get(&self, key: &str) -> Result<Option<JsonValue>, ClientError> {
        let request = self.http.get(self.url(&["get", key])?);
        not_found_as_none(self.send::<ValueResponse>(request).await).map(|r| r.map(|r| r.value))
    }

    /// Deletes `key`, returning whether anything was removed.
    pub async fn delete(&self, key: &str) -> Result<bool, ClientError> {
        let response: DeleteResponse = self
            .send(self.http.delete(self.url(&["delete", key])?))
            .await?;
        Ok(response.existed)
    }

    /// Pushes `value` onto the list at `key`, returning the new length.
    pub async fn push(&self, key: &str, value: JsonValue) -> Result<usize, ClientError> {
        let body = PushRequest {
            key: key.to_string(),
            value,
        };
        let response: PushResponse = self
            .send(self.http.post(self.url(&["list", "push"])?).json(&body))
            .await?;
        Ok(response.length)
    }

    /// Pops the most recently pushed value, or None if the list is empty.
    pub async fn pop(&self, key: &str) -> Result<Option<JsonValue>, ClientError> {
        let request = self.http.post(self.url(&["list", "pop", key])?);
        not_found_as_none(self.send::<ValueResponse>(request).await).map(|r| r.map(|r| r.value))
    }

    /// Asks the server to persist now, returning the number of entries saved.
    pub async fn snapshot(&self) -> Result<usize, ClientError> {
        let response: SnapshotResponse = self
            .send(self.http.post(self.url(&["snapshot"])?))
            .await?;
        Ok(response.entries)
    }

    pub async fn stats(&self) -> Result<StatsResponse, ClientError> {
        self.send(self.http.get(self.url(&["stats"])?)).await
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.send(self.http.get(self.url(&["health"])?)).await
    }

    // Segments are percent-encoded, so keys may contain '/' or spaces.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "cache server responded");

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        Err(ClientError::Status { status, message })
    }
}

fn not_found_as_none<T>(result: Result<T, ClientError>) -> Result<Option<T>, ClientError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
        Err(e) => Err(e),
    }
}
