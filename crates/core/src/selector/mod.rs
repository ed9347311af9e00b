//! Tier selection: which candidates of one content item to send to the
//! debrid provider.
//!
//! Singles are tried tier by tier from the highest resolution down, each
//! tier capped at `max_per_quality` accepted submissions. Packs are only a
//! fallback for items that have no single release at all.

mod tiers;
mod types;

pub use tiers::TierSelector;
pub use types::*;
