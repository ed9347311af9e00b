//! Warm passes over the work list.
//!
//! - [`CacheWarmer`] processes items one at a time: discovery, parsing,
//!   filtering and tier selection, with a pause between items.
//! - [`Scheduler`] repeats passes per [`RunMode`](crate::config::RunMode)
//!   until done or cancelled.

mod runner;
mod scheduler;
mod types;

pub use runner::CacheWarmer;
pub use scheduler::{RunSummary, Scheduler};
pub use types::*;
