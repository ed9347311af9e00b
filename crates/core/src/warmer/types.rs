//! Types for warm passes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::selector::SelectionOutcome;
use crate::store::StoreError;
use crate::stream::ContentKey;

/// Errors that end one content item. The pass continues with the next.
#[derive(Debug, Error)]
pub enum WarmError {
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("dedup store error: {0}")]
    Store(#[from] StoreError),
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkItem {
    Movie {
        imdb_id: String,
    },
    Episode {
        series_id: String,
        season: u32,
        episode: u32,
    },
}

impl WorkItem {
    pub fn movie(imdb_id: impl Into<String>) -> Self {
        WorkItem::Movie {
            imdb_id: imdb_id.into(),
        }
    }

    pub fn episode(series_id: impl Into<String>, season: u32, episode: u32) -> Self {
        WorkItem::Episode {
            series_id: series_id.into(),
            season,
            episode,
        }
    }

    /// Dedup identity. Episodes collapse to their season.
    pub fn content_key(&self) -> ContentKey {
        match self {
            WorkItem::Movie { imdb_id } => ContentKey::movie(imdb_id.clone()),
            WorkItem::Episode {
                series_id, season, ..
            } => ContentKey::season(series_id.clone(), *season),
        }
    }

    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkItem::Movie { .. } => "movie",
            WorkItem::Episode { .. } => "episode",
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::Movie { imdb_id } => write!(f, "movie: {}", imdb_id),
            WorkItem::Episode {
                series_id,
                season,
                episode,
            } => write!(f, "S{:02}E{:02}: {}", season, episode, series_id),
        }
    }
}

/// Ordered items for one pass: movies first, then episodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkList {
    items: Vec<WorkItem>,
}

impl WorkList {
    /// Build a list from movies and episodes, movies first.
    pub fn new(movies: Vec<WorkItem>, episodes: Vec<WorkItem>) -> Self {
        let mut items = movies;
        items.extend(episodes);
        Self { items }
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn movie_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, WorkItem::Movie { .. }))
            .count()
    }

    pub fn episode_count(&self) -> usize {
        self.len() - self.movie_count()
    }
}

impl From<Vec<WorkItem>> for WorkList {
    fn from(items: Vec<WorkItem>) -> Self {
        Self { items }
    }
}

/// Result of warming one item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub item: WorkItem,
    /// Streams returned by discovery.
    pub discovered: usize,
    /// Candidates handed to the selector.
    pub candidates: usize,
    pub outcome: SelectionOutcome,
}

/// Summary of one pass over the work list.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub items_processed: usize,
    pub items_failed: usize,
    /// Items never started because the pass was cancelled.
    pub items_skipped: usize,
    pub submissions: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancelled: bool,
}

impl PassReport {
    pub fn started() -> Self {
        Self {
            items_processed: 0,
            items_failed: 0,
            items_skipped: 0,
            submissions: 0,
            started_at: Utc::now(),
            finished_at: None,
            cancelled: false,
        }
    }
}

/// Live status, shared with the control API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarmerStatus {
    pub running: bool,
    /// Item being processed, e.g. `movie: tt0111161`.
    pub current_item: Option<String>,
    pub passes_completed: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_pass: Option<PassReport>,
}
