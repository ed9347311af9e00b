//! Stremio addon catalog client.
//!
//! Reads an addon manifest, picks one catalog and pages through it to
//! collect content IDs.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CatalogTarget;

/// Errors that can occur while reading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Catalog API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Catalog not found in manifest: {0}")]
    CatalogNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if e.is_connect() {
            CatalogError::ConnectionFailed(e.to_string())
        } else {
            CatalogError::ApiError(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    catalogs: Vec<CatalogEntry>,
}

/// One catalog declared by an addon manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    #[serde(rename = "type", default = "default_catalog_type")]
    pub content_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "pageSize", default)]
    pub page_size: Option<u32>,
}

fn default_catalog_type() -> String {
    "movie".to_string()
}

#[derive(Debug, Deserialize)]
struct CatalogPage {
    #[serde(default)]
    metas: Vec<CatalogMeta>,
}

#[derive(Debug, Deserialize)]
struct CatalogMeta {
    #[serde(default)]
    id: String,
}

/// IDs read from one catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIds {
    /// Stremio content type of the catalog, e.g. "movie" or "series".
    pub content_type: String,
    /// `tt…` and `tmdb:…` IDs in catalog order.
    pub ids: Vec<String>,
}

const DEFAULT_PAGE_SIZE: u32 = 100;

/// HTTP client for Stremio addon catalogs.
pub struct StremioCatalogClient {
    client: Client,
    page_delay: Duration,
}

impl StremioCatalogClient {
    pub fn new(timeout_secs: u32) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs as u64))
            .build()
            .map_err(|e| CatalogError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            page_delay: Duration::from_millis(500),
        })
    }

    /// Override the pause between page requests.
    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Collect IDs from the configured catalog.
    ///
    /// Stops at the first empty page, after `max_pages`, or on cancellation.
    /// A failing page ends paging but keeps the IDs already collected.
    pub async fn catalog_ids(
        &self,
        target: &CatalogTarget,
        token: &CancellationToken,
    ) -> Result<CatalogIds, CatalogError> {
        let manifest = self.fetch_manifest(&target.manifest_url).await?;
        let catalog = pick_catalog(manifest.catalogs, target.catalog_id.as_deref())?;
        let page_size = catalog.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let base = addon_base_url(&target.manifest_url);

        info!(
            catalog = %catalog.id,
            content_type = %catalog.content_type,
            name = catalog.name.as_deref().unwrap_or(""),
            "Reading addon catalog"
        );

        let mut ids = Vec::new();
        for page in 0..target.max_pages {
            if token.is_cancelled() {
                info!("Catalog read cancelled");
                break;
            }

            let skip = page_skip(page, page_size);
            let url = format!(
                "{}/catalog/{}/{}.json?skip={}",
                base,
                catalog.content_type,
                urlencoding::encode(&catalog.id),
                skip
            );

            let metas = match self.fetch_page(&url).await {
                Ok(metas) => metas,
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to fetch catalog page");
                    break;
                }
            };
            if metas.is_empty() {
                debug!(skip, "No more items in catalog");
                break;
            }

            ids.extend(content_ids(&metas));
            debug!(skip, items = metas.len(), collected = ids.len(), "Catalog page read");

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.page_delay) => {}
            }
        }

        info!(catalog = %catalog.id, ids = ids.len(), "Catalog read complete");
        Ok(CatalogIds {
            content_type: catalog.content_type,
            ids,
        })
    }

    async fn fetch_manifest(&self, manifest_url: &str) -> Result<Manifest, CatalogError> {
        let response = self.client.get(manifest_url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::ApiError(format!(
                "HTTP {} for manifest",
                response.status()
            )));
        }
        let body = response.text().await?;
        parse_manifest(&body)
    }

    async fn fetch_page(&self, url: &str) -> Result<Vec<CatalogMeta>, CatalogError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::ApiError(format!("HTTP {}", response.status())));
        }
        let page: CatalogPage = response
            .json()
            .await
            .map_err(|e| CatalogError::ApiError(format!("Failed to parse catalog page: {}", e)))?;
        Ok(page.metas)
    }
}

fn parse_manifest(body: &str) -> Result<Manifest, CatalogError> {
    serde_json::from_str(body).map_err(|e| CatalogError::InvalidManifest(e.to_string()))
}

fn pick_catalog(
    catalogs: Vec<CatalogEntry>,
    wanted: Option<&str>,
) -> Result<CatalogEntry, CatalogError> {
    match wanted {
        Some(id) => catalogs
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CatalogError::CatalogNotFound(id.to_string())),
        None => catalogs
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::InvalidManifest("manifest has no catalogs".to_string())),
    }
}

/// `skip` offset of a page. Page sizes come from the manifest, so the
/// product saturates.
fn page_skip(page: u32, page_size: u32) -> u32 {
    page.saturating_mul(page_size)
}

/// Addon root for a manifest URL.
fn addon_base_url(manifest_url: &str) -> &str {
    let trimmed = manifest_url.trim_end_matches('/');
    trimmed
        .strip_suffix("/manifest.json")
        .unwrap_or(trimmed)
}

fn content_ids(metas: &[CatalogMeta]) -> Vec<String> {
    metas
        .iter()
        .filter(|m| m.id.starts_with("tt") || m.id.starts_with("tmdb:"))
        .map(|m| m.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest_requires_catalogs() {
        let manifest = parse_manifest(
            r#"{"id": "org.addon", "catalogs": [{"id": "top", "type": "movie", "pageSize": 50}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.catalogs.len(), 1);
        assert_eq!(manifest.catalogs[0].page_size, Some(50));

        let err = parse_manifest(r#"{"id": "org.addon"}"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidManifest(_)));
    }

    #[test]
    fn test_pick_catalog() {
        let catalogs = vec![
            CatalogEntry {
                id: "top".into(),
                content_type: "movie".into(),
                name: None,
                page_size: None,
            },
            CatalogEntry {
                id: "shows".into(),
                content_type: "series".into(),
                name: None,
                page_size: None,
            },
        ];

        assert_eq!(pick_catalog(catalogs.clone(), None).unwrap().id, "top");
        assert_eq!(
            pick_catalog(catalogs.clone(), Some("shows")).unwrap().content_type,
            "series"
        );
        assert!(matches!(
            pick_catalog(catalogs, Some("missing")),
            Err(CatalogError::CatalogNotFound(_))
        ));
        assert!(pick_catalog(Vec::new(), None).is_err());
    }

    #[test]
    fn test_catalog_type_defaults_to_movie() {
        let entry: CatalogEntry = serde_json::from_str(r#"{"id": "top"}"#).unwrap();
        assert_eq!(entry.content_type, "movie");
    }

    #[test]
    fn test_page_skip() {
        assert_eq!(page_skip(0, 100), 0);
        assert_eq!(page_skip(3, 100), 300);
        assert_eq!(page_skip(2, u32::MAX), u32::MAX);
    }

    #[test]
    fn test_addon_base_url() {
        assert_eq!(
            addon_base_url("https://addon.example/abc/manifest.json"),
            "https://addon.example/abc"
        );
        assert_eq!(addon_base_url("https://addon.example/abc/"), "https://addon.example/abc");
    }

    #[test]
    fn test_content_ids_keeps_imdb_and_tmdb() {
        let page: CatalogPage = serde_json::from_str(
            r#"{"metas": [{"id": "tt0111161"}, {"id": "tmdb:278"}, {"id": "kitsu:1"}, {"name": "no id"}]}"#,
        )
        .unwrap();
        assert_eq!(content_ids(&page.metas), vec!["tt0111161", "tmdb:278"]);
    }
}
