//! Mock stream source for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::discovery::{DiscoveryError, StreamSource};
use crate::stream::RawStream;

/// Mock implementation of the StreamSource trait.
///
/// Streams are keyed by Stremio video id: `tt0111161` for a movie and
/// `tt0944947:1:2` for an episode. Unknown ids return no streams.
#[derive(Debug, Default)]
pub struct MockStreamSource {
    streams: Arc<RwLock<HashMap<String, Vec<RawStream>>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl MockStreamSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_movie_streams(&self, imdb_id: &str, streams: Vec<RawStream>) {
        self.streams
            .write()
            .await
            .insert(imdb_id.to_string(), streams);
    }

    /// Append one stream to a movie's list.
    pub async fn push_movie_stream(&self, imdb_id: &str, stream: RawStream) {
        self.streams
            .write()
            .await
            .entry(imdb_id.to_string())
            .or_default()
            .push(stream);
    }

    pub async fn set_episode_streams(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
        streams: Vec<RawStream>,
    ) {
        self.streams
            .write()
            .await
            .insert(episode_video_id(series_id, season, episode), streams);
    }

    /// Make lookups for this video id fail.
    pub async fn fail_for(&self, video_id: &str) {
        self.failing.write().await.insert(video_id.to_string());
    }

    /// Video ids requested so far, in call order.
    pub async fn requested(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }

    async fn lookup(&self, video_id: String) -> Result<Vec<RawStream>, DiscoveryError> {
        self.requests.write().await.push(video_id.clone());
        if self.failing.read().await.contains(&video_id) {
            return Err(DiscoveryError::ApiError(format!(
                "HTTP 502 Bad Gateway: {}",
                video_id
            )));
        }
        Ok(self
            .streams
            .read()
            .await
            .get(&video_id)
            .cloned()
            .unwrap_or_default())
    }
}

fn episode_video_id(series_id: &str, season: u32, episode: u32) -> String {
    format!("{}:{}:{}", series_id, season, episode)
}

#[async_trait]
impl StreamSource for MockStreamSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn movie_streams(&self, imdb_id: &str) -> Result<Vec<RawStream>, DiscoveryError> {
        self.lookup(imdb_id.to_string()).await
    }

    async fn episode_streams(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<Vec<RawStream>, DiscoveryError> {
        self.lookup(episode_video_id(series_id, season, episode))
            .await
    }
}
