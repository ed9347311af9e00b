//! Testing utilities and mock implementations.
//!
//! Mocks for the two network collaborators, so passes can run end to end
//! against an in-memory dedup store without any real service.
//!
//! # Example
//!
//! ```rust,ignore
//! use cachewarmer_core::testing::{fixtures, MockDebridClient, MockStreamSource};
//!
//! let source = MockStreamSource::new();
//! source.set_movie_streams("tt0111161", vec![
//!     fixtures::raw_stream(&fixtures::stream_title("Movie 1080p", 25, 2.0), &fixtures::hash(1)),
//! ]).await;
//!
//! let debrid = MockDebridClient::new();
//! // ... warm the item, then inspect debrid.submitted_hashes()
//! ```

mod mock_debrid;
mod mock_stream_source;

pub use mock_debrid::MockDebridClient;
pub use mock_stream_source::MockStreamSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::BTreeSet;

    use crate::stream::{RawStream, Resolution, StreamCandidate};

    /// Deterministic 40-character lowercase info hash.
    pub fn hash(n: u32) -> String {
        format!("{:040x}", n)
    }

    /// A Torrentio-style title: name line, then seeders and size line.
    pub fn stream_title(name: &str, seeders: u32, size_gb: f64) -> String {
        format!("{}\n👤 {} 💾 {} GB", name, seeders, size_gb)
    }

    pub fn raw_stream(title: &str, info_hash: &str) -> RawStream {
        RawStream {
            title: title.to_string(),
            info_hash: Some(info_hash.to_string()),
        }
    }

    /// A single (non-pack) candidate.
    pub fn candidate(
        info_hash: &str,
        resolution: Resolution,
        seeders: u32,
        size_mb: f64,
    ) -> StreamCandidate {
        StreamCandidate {
            title: format!("Some Movie {}", resolution),
            info_hash: info_hash.to_string(),
            seeders,
            resolution,
            size_mb,
            is_pack: false,
            pack_seasons: BTreeSet::new(),
        }
    }

    /// A pack candidate covering `seasons` (may be empty).
    pub fn pack_candidate(
        info_hash: &str,
        resolution: Resolution,
        seeders: u32,
        seasons: &[u32],
    ) -> StreamCandidate {
        StreamCandidate {
            title: format!("Some Show Complete Pack {}", resolution),
            info_hash: info_hash.to_string(),
            seeders,
            resolution,
            size_mb: 40_000.0,
            is_pack: true,
            pack_seasons: seasons.iter().copied().collect(),
        }
    }
}
