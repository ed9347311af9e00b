//! Debrid provider abstraction.
//!
//! A `DebridClient` answers whether a torrent is already cached upstream and
//! accepts magnets to cache. Real-Debrid is the only backend.

mod real_debrid;
mod types;

pub use real_debrid::RealDebridClient;
pub use types::*;
