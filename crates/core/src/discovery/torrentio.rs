//! Torrentio (Stremio addon) discovery backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::DiscoveryConfig;
use crate::stream::RawStream;

use super::{DiscoveryError, StreamSource};

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    streams: Vec<RawStream>,
}

/// Torrentio stream discovery client.
pub struct TorrentioSource {
    client: Client,
    config: DiscoveryConfig,
}

impl TorrentioSource {
    /// Create a new Torrentio client.
    pub fn new(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| {
                DiscoveryError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Build the stream URL for a Stremio content type and video id.
    fn stream_url(&self, kind: &str, video_id: &str) -> String {
        let base = self.config.url.trim_end_matches('/');
        let options = self.config.options.trim_matches('/');
        if options.is_empty() {
            format!("{}/stream/{}/{}.json", base, kind, video_id)
        } else {
            format!("{}/{}/stream/{}/{}.json", base, options, kind, video_id)
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<RawStream>, DiscoveryError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: StreamsResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::ApiError(format!("Failed to parse response: {}", e)))?;

        debug!(url = %url, streams = parsed.streams.len(), "Torrentio lookup complete");
        Ok(parsed.streams)
    }
}

#[async_trait]
impl StreamSource for TorrentioSource {
    fn name(&self) -> &str {
        "torrentio"
    }

    async fn movie_streams(&self, imdb_id: &str) -> Result<Vec<RawStream>, DiscoveryError> {
        let url = self.stream_url("movie", &urlencoding::encode(imdb_id));
        self.fetch(&url).await
    }

    async fn episode_streams(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<Vec<RawStream>, DiscoveryError> {
        let video_id = format!("{}:{}:{}", urlencoding::encode(series_id), season, episode);
        let url = self.stream_url("series", &video_id);
        self.fetch(&url).await
    }
}
