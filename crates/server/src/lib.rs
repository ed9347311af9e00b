//! HTTP control surface and process wiring for the cache warmer.

pub mod api;
pub mod metrics;
pub mod state;
