//! Stream discovery abstraction.
//!
//! A `StreamSource` lists the torrent streams known for a movie or an
//! episode. Torrentio is the only backend.

mod torrentio;
mod types;

pub use torrentio::TorrentioSource;
pub use types::*;
