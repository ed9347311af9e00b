//! Persistent dedup records.
//!
//! Two append-only sets make repeated passes safe: info hashes whose
//! decision is final, and `(imdb_id, resolution, season)` triples that are
//! already satisfied.

mod sqlite;
mod types;

pub use sqlite::SqliteDedupStore;
pub use types::*;
