//! Types for debrid provider operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during debrid provider operations.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for DebridError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DebridError::Timeout
        } else if e.is_connect() {
            DebridError::ConnectionFailed(e.to_string())
        } else {
            DebridError::ApiError(e.to_string())
        }
    }
}

/// Result of asking the provider whether a torrent is already cached.
///
/// `Unknown` means the check itself failed. Callers must not record any
/// decision for the hash in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Cached,
    NotCached,
    Unknown,
}

impl CacheStatus {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Cached => "cached",
            CacheStatus::NotCached => "not_cached",
            CacheStatus::Unknown => "unknown",
        }
    }
}

/// Magnet URI for an info hash.
pub fn magnet_uri(info_hash: &str) -> String {
    format!("magnet:?xt=urn:btih:{}", info_hash)
}

/// Trait for debrid providers.
#[async_trait]
pub trait DebridClient: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Verify credentials and connectivity. Called once before any pass.
    async fn verify_connection(&self) -> Result<(), DebridError>;

    /// Tri-state cache lookup. Transport failures map to `Unknown`.
    async fn check_cached(&self, info_hash: &str) -> CacheStatus;

    /// Ask the provider to start caching a magnet.
    async fn submit_magnet(&self, magnet: &str) -> Result<(), DebridError>;
}
