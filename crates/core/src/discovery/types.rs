//! Types for stream discovery.

use async_trait::async_trait;
use thiserror::Error;

use crate::stream::RawStream;

/// Errors that can occur while discovering streams.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Discovery backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Discovery backend API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DiscoveryError::Timeout
        } else if e.is_connect() {
            DiscoveryError::ConnectionFailed(e.to_string())
        } else {
            DiscoveryError::ApiError(e.to_string())
        }
    }
}

/// Trait for stream discovery backends.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Streams for a movie.
    async fn movie_streams(&self, imdb_id: &str) -> Result<Vec<RawStream>, DiscoveryError>;

    /// Streams for one episode of a series.
    async fn episode_streams(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<Vec<RawStream>, DiscoveryError>;
}
