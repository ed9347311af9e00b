//! Work list construction from configured targets.

mod stremio;

pub use stremio::{CatalogEntry, CatalogError, CatalogIds, StremioCatalogClient};

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{SeriesTarget, TargetsConfig};
use crate::warmer::{WorkItem, WorkList};

static IMDB_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)tt\d{7,}").unwrap());

/// Extract a lowercase IMDb ID from a raw ID or an IMDb URL.
pub fn normalize_imdb_id(input: &str) -> Option<String> {
    IMDB_ID_RE
        .find(input.trim())
        .map(|m| m.as_str().to_lowercase())
}

/// Movie ID accepted by discovery: an IMDb ID, or a `tmdb:` ID as listed
/// by addon catalogs.
fn movie_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.starts_with("tmdb:") {
        return Some(trimmed.to_string());
    }
    normalize_imdb_id(trimmed)
}

/// Normalize and dedupe movie inputs, keeping first occurrences.
pub fn movie_items(inputs: &[String]) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for input in inputs {
        if input.trim().is_empty() {
            continue;
        }
        match movie_id(input) {
            Some(id) => {
                if seen.insert(id.clone()) {
                    items.push(WorkItem::movie(id));
                }
            }
            None => warn!(input = %input, "Invalid movie ID/URL, skipping"),
        }
    }
    items
}

/// Expand series targets into episode items.
///
/// Each series yields its episodes ordered by (season, episode), without
/// duplicates. Series keep their configured order.
pub fn episode_items(series: &[SeriesTarget]) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for target in series {
        let Some(series_id) = normalize_imdb_id(&target.id) else {
            warn!(input = %target.id, "Invalid series ID/URL, skipping");
            continue;
        };

        let episodes: BTreeSet<(u32, u32)> = target
            .seasons
            .iter()
            .flat_map(|s| (1..=s.episodes).map(move |e| (s.season, e)))
            .collect();
        if episodes.is_empty() {
            warn!(series_id = %series_id, "No episodes configured, skipping");
            continue;
        }

        info!(series_id = %series_id, episodes = episodes.len(), "Expanded series");
        for (season, episode) in episodes {
            let item = WorkItem::episode(series_id.clone(), season, episode);
            if seen.insert(item.clone()) {
                items.push(item);
            }
        }
    }
    items
}

/// Build the work list: configured movies, catalog movies, then episodes.
///
/// A failing catalog is logged and skipped. The result may be empty; the
/// caller decides whether that is fatal.
pub async fn build_work_list(
    targets: &TargetsConfig,
    catalogs: &StremioCatalogClient,
    token: &CancellationToken,
) -> WorkList {
    let mut movie_inputs = targets.movies.clone();

    for target in &targets.catalogs {
        if token.is_cancelled() {
            break;
        }
        match catalogs.catalog_ids(target, token).await {
            Ok(found) if found.content_type == "movie" => {
                info!(manifest = %target.manifest_url, ids = found.ids.len(), "Catalog movies added");
                movie_inputs.extend(found.ids);
            }
            Ok(found) => warn!(
                manifest = %target.manifest_url,
                content_type = %found.content_type,
                "Only movie catalogs are supported, skipping"
            ),
            Err(e) => error!(manifest = %target.manifest_url, error = %e, "Failed to read catalog"),
        }
    }

    let movies = movie_items(&movie_inputs);
    let episodes = episode_items(&targets.series);
    WorkList::new(movies, episodes)
}
