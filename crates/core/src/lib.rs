pub mod config;
pub mod debrid;
pub mod discovery;
pub mod metrics;
pub mod selector;
pub mod store;
pub mod stream;
pub mod targets;
pub mod testing;
pub mod warmer;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, RunMode,
    SanitizedConfig, WarmerConfig,
};
pub use debrid::{CacheStatus, DebridClient, DebridError, RealDebridClient};
pub use discovery::{DiscoveryError, StreamSource, TorrentioSource};
pub use selector::{
    CandidateKind, CandidatePool, SelectionOutcome, SelectionThresholds, TierSelector,
};
pub use store::{DedupStats, DedupStore, SqliteDedupStore, StoreError};
pub use stream::{parse_stream, ContentKey, RawStream, Resolution, StreamCandidate};
pub use targets::{build_work_list, normalize_imdb_id, CatalogError, StremioCatalogClient};
pub use warmer::{
    CacheWarmer, PassReport, RunSummary, Scheduler, WarmError, WarmerStatus, WorkItem, WorkList,
};
