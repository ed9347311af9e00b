use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::stream::Resolution;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub debrid: DebridConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub warmer: WarmerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Real-Debrid connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    /// Real-Debrid API token
    pub api_key: String,
    /// REST base URL (default: "https://api.real-debrid.com/rest/1.0")
    #[serde(default = "default_debrid_url")]
    pub url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_debrid_url() -> String {
    "https://api.real-debrid.com/rest/1.0".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Stream discovery (Torrentio) settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_discovery_url")]
    pub url: String,
    /// Addon option path segment, e.g. "sort=qualitysize"
    #[serde(default = "default_discovery_options")]
    pub options: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            url: default_discovery_url(),
            options: default_discovery_options(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_discovery_url() -> String {
    "https://torrentio.strem.fun".to_string()
}

fn default_discovery_options() -> String {
    "sort=qualitysize".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cachewarmer.db")
}

/// Selection thresholds and pacing for a warm pass
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WarmerConfig {
    #[serde(default = "default_min_seeders")]
    pub min_seeders: u32,
    /// Lowest accepted tier: 480, 720, 1080 or 2160
    #[serde(default = "default_min_resolution")]
    pub min_resolution: Resolution,
    /// Submissions allowed per tier per item
    #[serde(default = "default_max_per_quality")]
    pub max_per_quality: u32,
    #[serde(default = "default_true")]
    pub allow_packs_fallback: bool,
    /// Seconds to wait between content items
    #[serde(default = "default_delay_between_movies")]
    pub delay_between_movies: u64,
    #[serde(default = "default_max_streams_per_item")]
    pub max_streams_per_item: usize,
    /// Pause between candidate evaluations, in milliseconds
    #[serde(default = "default_candidate_yield_ms")]
    pub candidate_yield_ms: u64,
}

impl Default for WarmerConfig {
    fn default() -> Self {
        Self {
            min_seeders: default_min_seeders(),
            min_resolution: default_min_resolution(),
            max_per_quality: default_max_per_quality(),
            allow_packs_fallback: true,
            delay_between_movies: default_delay_between_movies(),
            max_streams_per_item: default_max_streams_per_item(),
            candidate_yield_ms: default_candidate_yield_ms(),
        }
    }
}

fn default_min_seeders() -> u32 {
    5
}

fn default_min_resolution() -> Resolution {
    Resolution::Hd
}

fn default_max_per_quality() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_delay_between_movies() -> u64 {
    5
}

fn default_max_streams_per_item() -> usize {
    50
}

fn default_candidate_yield_ms() -> u64 {
    5
}

/// How passes are repeated
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// A single pass, then exit
    #[default]
    Oneshot,
    /// Passes back to back until stopped
    Loop,
    /// A pass every `repeat_minutes`
    Interval,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Oneshot => "oneshot",
            RunMode::Loop => "loop",
            RunMode::Interval => "interval",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub run_mode: RunMode,
    #[serde(default = "default_repeat_minutes")]
    pub repeat_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            run_mode: RunMode::default(),
            repeat_minutes: default_repeat_minutes(),
        }
    }
}

fn default_repeat_minutes() -> u64 {
    60
}

/// Content to warm
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TargetsConfig {
    /// IMDb IDs or IMDb title URLs
    #[serde(default)]
    pub movies: Vec<String>,
    #[serde(default)]
    pub series: Vec<SeriesTarget>,
    #[serde(default)]
    pub catalogs: Vec<CatalogTarget>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeriesTarget {
    /// IMDb ID or IMDb title URL
    pub id: String,
    #[serde(default)]
    pub seasons: Vec<SeasonTarget>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeasonTarget {
    pub season: u32,
    /// Number of episodes; expands to episodes 1..=episodes
    pub episodes: u32,
}

/// A Stremio addon catalog used as a movie source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogTarget {
    pub manifest_url: String,
    /// Catalog to read; the manifest's first catalog when absent
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_max_pages() -> u32 {
    5
}

/// Control API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub debrid: SanitizedDebridConfig,
    pub discovery: DiscoveryConfig,
    pub database: DatabaseConfig,
    pub warmer: WarmerConfig,
    pub schedule: ScheduleConfig,
    pub targets: TargetsConfig,
    pub server: ServerConfig,
}

/// Debrid config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            debrid: SanitizedDebridConfig {
                url: config.debrid.url.clone(),
                api_key_configured: !config.debrid.api_key.is_empty(),
                timeout_secs: config.debrid.timeout_secs,
            },
            discovery: config.discovery.clone(),
            database: config.database.clone(),
            warmer: config.warmer.clone(),
            schedule: config.schedule.clone(),
            targets: config.targets.clone(),
            server: config.server.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let toml = r#"
[debrid]
api_key = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.debrid.url, "https://api.real-debrid.com/rest/1.0");
        assert_eq!(config.discovery.options, "sort=qualitysize");
        assert_eq!(config.warmer.min_seeders, 5);
        assert_eq!(config.warmer.min_resolution, Resolution::Hd);
        assert_eq!(config.warmer.max_per_quality, 1);
        assert!(config.warmer.allow_packs_fallback);
        assert_eq!(config.warmer.delay_between_movies, 5);
        assert_eq!(config.warmer.max_streams_per_item, 50);
        assert_eq!(config.schedule.run_mode, RunMode::Oneshot);
        assert_eq!(config.schedule.repeat_minutes, 60);
        assert!(!config.server.enabled);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert!(config.targets.movies.is_empty());
    }

    #[test]
    fn test_missing_debrid_fails() {
        let toml = r#"
[warmer]
min_seeders = 3
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[debrid]
api_key = "secret"
timeout_secs = 10

[warmer]
min_seeders = 2
min_resolution = 1080
max_per_quality = 2
allow_packs_fallback = false

[schedule]
run_mode = "interval"
repeat_minutes = 15

[targets]
movies = ["tt0111161", "https://www.imdb.com/title/tt0068646/"]

[[targets.series]]
id = "tt0944947"
seasons = [{ season = 1, episodes = 10 }, { season = 2, episodes = 10 }]

[[targets.catalogs]]
manifest_url = "https://addon.example/manifest.json"
catalog_id = "top"

[server]
enabled = true
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.warmer.min_resolution, Resolution::FullHd);
        assert_eq!(config.warmer.max_per_quality, 2);
        assert!(!config.warmer.allow_packs_fallback);
        assert_eq!(config.schedule.run_mode, RunMode::Interval);
        assert_eq!(config.targets.movies.len(), 2);
        assert_eq!(config.targets.series[0].seasons.len(), 2);
        assert_eq!(config.targets.catalogs[0].max_pages, 5);
        assert_eq!(config.targets.catalogs[0].catalog_id.as_deref(), Some("top"));
        assert!(config.server.enabled);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_min_resolution_rejected() {
        let toml = r#"
[debrid]
api_key = "secret"

[warmer]
min_resolution = 900
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_unknown_run_mode_rejected() {
        let toml = r#"
[debrid]
api_key = "secret"

[schedule]
run_mode = "forever"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_sanitized_config_hides_key() {
        let config: Config = toml::from_str(
            r#"
[debrid]
api_key = "super-secret"
"#,
        )
        .unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.debrid.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(json.contains("\"min_resolution\":720"));
        assert!(json.contains("\"run_mode\":\"oneshot\""));
    }
}
