//! Dedup store trait and types.

use serde::Serialize;
use thiserror::Error;

use crate::stream::Resolution;

/// Errors from the dedup store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Row counts of both record sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub attempted_hashes: u64,
    pub cached_qualities: u64,
}

/// Durable, append-only record of warming decisions.
///
/// Both record sets only grow. Inserts are idempotent, every read sees all
/// earlier writes, and a write is persisted before the call returns.
pub trait DedupStore: Send + Sync {
    /// Whether a final decision was already recorded for this info hash.
    fn has_attempted(&self, info_hash: &str) -> Result<bool, StoreError>;

    /// Record a final decision for this info hash.
    fn mark_attempted(&self, info_hash: &str) -> Result<(), StoreError>;

    /// Whether the item is already satisfied at this tier.
    /// `season = None` is the movie record, distinct from every season.
    fn has_cached_quality(
        &self,
        imdb_id: &str,
        resolution: Resolution,
        season: Option<u32>,
    ) -> Result<bool, StoreError>;

    /// Record that the item is satisfied at this tier.
    fn mark_cached_quality(
        &self,
        imdb_id: &str,
        resolution: Resolution,
        season: Option<u32>,
    ) -> Result<(), StoreError>;

    /// Record a successful submission atomically: the info hash plus the
    /// tier for each listed season (`None` is the movie record). Either
    /// every row is written or none is.
    fn record_submission(
        &self,
        info_hash: &str,
        imdb_id: &str,
        resolution: Resolution,
        seasons: &[Option<u32>],
    ) -> Result<(), StoreError>;

    /// Sizes of both record sets.
    fn stats(&self) -> Result<DedupStats, StoreError>;
}
