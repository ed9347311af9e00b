//! Real-Debrid provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DebridConfig;

use super::{CacheStatus, DebridClient, DebridError};

/// Real-Debrid REST client (bearer token auth).
pub struct RealDebridClient {
    client: Client,
    config: DebridConfig,
}

impl RealDebridClient {
    /// Create a new Real-Debrid client.
    pub fn new(config: DebridConfig) -> Result<Self, DebridError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| DebridError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    async fn error_body(response: reqwest::Response) -> String {
        let body = response.text().await.unwrap_or_default();
        body.chars().take(200).collect()
    }
}

/// Whether an instantAvailability response lists any cached variant for the hash.
fn availability_has_variants(body: &Value, info_hash: &str) -> bool {
    let entry = body
        .get(info_hash)
        .or_else(|| body.get(info_hash.to_uppercase()));
    match entry {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        _ => false,
    }
}

#[async_trait]
impl DebridClient for RealDebridClient {
    fn name(&self) -> &str {
        "real-debrid"
    }

    async fn verify_connection(&self) -> Result<(), DebridError> {
        let url = format!("{}/user", self.base_url());
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                debug!("Real-Debrid credentials accepted");
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(DebridError::AuthenticationFailed(Self::error_body(response).await))
            }
            status => Err(DebridError::ApiError(format!(
                "HTTP {}: {}",
                status,
                Self::error_body(response).await
            ))),
        }
    }

    async fn check_cached(&self, info_hash: &str) -> CacheStatus {
        let url = format!(
            "{}/torrents/instantAvailability/{}",
            self.base_url(),
            info_hash
        );

        let response = match self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(info_hash = %info_hash, error = %DebridError::from(e), "Cache check failed");
                return CacheStatus::Unknown;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = Self::error_body(response).await;
            warn!(info_hash = %info_hash, status = %status, body = %body, "Cache check rejected");
            return CacheStatus::Unknown;
        }

        match response.json::<Value>().await {
            Ok(body) if availability_has_variants(&body, info_hash) => CacheStatus::Cached,
            Ok(_) => CacheStatus::NotCached,
            Err(e) => {
                warn!(info_hash = %info_hash, error = %e, "Cache check returned invalid JSON");
                CacheStatus::Unknown
            }
        }
    }

    async fn submit_magnet(&self, magnet: &str) -> Result<(), DebridError> {
        let url = format!("{}/torrents/addMagnet", self.base_url());
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .form(&[("magnet", magnet)])
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(DebridError::AuthenticationFailed(Self::error_body(response).await))
            }
            status => Err(DebridError::ApiError(format!(
                "HTTP {}: {}",
                status,
                Self::error_body(response).await
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_availability_with_variants() {
        let body = json!({ "abc123": { "rd": [ { "1": { "filename": "movie.mkv" } } ] } });
        assert!(availability_has_variants(&body, "abc123"));
    }

    #[test]
    fn test_availability_empty_entry() {
        assert!(!availability_has_variants(&json!({ "abc123": [] }), "abc123"));
        assert!(!availability_has_variants(&json!({ "abc123": {} }), "abc123"));
    }

    #[test]
    fn test_availability_missing_hash() {
        assert!(!availability_has_variants(&json!({}), "abc123"));
        assert!(!availability_has_variants(&json!([]), "abc123"));
    }

    #[test]
    fn test_availability_uppercase_key() {
        let body = json!({ "ABC123": { "rd": [ {} ] } });
        assert!(availability_has_variants(&body, "abc123"));
    }

    #[test]
    fn test_client_builds() {
        let client = RealDebridClient::new(DebridConfig {
            api_key: "token".to_string(),
            url: "https://api.real-debrid.com/rest/1.0/".to_string(),
            timeout_secs: 20,
        })
        .unwrap();
        assert_eq!(client.base_url(), "https://api.real-debrid.com/rest/1.0");
        assert_eq!(client.name(), "real-debrid");
    }
}
