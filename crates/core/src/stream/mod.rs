//! Stream model and title parsing.
//!
//! Raw streams come from a discovery backend; [`parse_raw_stream`] turns the
//! usable ones into [`StreamCandidate`]s that the selector works with.

mod parser;
mod types;

pub use parser::{
    extract_pack_seasons, extract_resolution, extract_seeders, extract_size_mb, is_blacklisted,
    is_pack, parse_raw_stream, parse_stream,
};
pub use types::*;
