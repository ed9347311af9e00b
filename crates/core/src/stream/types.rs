//! Types shared by stream discovery, parsing and selection.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Quality tier derived from a stream title.
///
/// Ordered by pixel height so that `Uhd > FullHd > Hd > Sd > Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Resolution {
    /// No recognizable marker in the title.
    Unknown,
    /// 480p and known standard-definition rips.
    Sd,
    /// 720p.
    Hd,
    /// 1080p.
    FullHd,
    /// 2160p / 4K.
    Uhd,
}

impl Resolution {
    /// All selectable tiers, highest first.
    pub const TIERS_DESC: [Resolution; 4] = [
        Resolution::Uhd,
        Resolution::FullHd,
        Resolution::Hd,
        Resolution::Sd,
    ];

    /// Pixel height used in configuration and storage (`0` for unknown).
    pub fn height(self) -> u32 {
        match self {
            Resolution::Unknown => 0,
            Resolution::Sd => 480,
            Resolution::Hd => 720,
            Resolution::FullHd => 1080,
            Resolution::Uhd => 2160,
        }
    }

    /// Map a pixel height back to a selectable tier.
    pub fn from_height(height: u32) -> Option<Self> {
        match height {
            480 => Some(Resolution::Sd),
            720 => Some(Resolution::Hd),
            1080 => Some(Resolution::FullHd),
            2160 => Some(Resolution::Uhd),
            _ => None,
        }
    }
}

impl TryFrom<u32> for Resolution {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Resolution::from_height(value).ok_or_else(|| {
            format!(
                "invalid resolution {}, expected one of 480, 720, 1080, 2160",
                value
            )
        })
    }
}

impl From<Resolution> for u32 {
    fn from(value: Resolution) -> Self {
        value.height()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Unknown => write!(f, "unknown"),
            other => write!(f, "{}p", other.height()),
        }
    }
}

/// Identity of a content item for dedup purposes.
///
/// Movies carry no season. Episodes carry only their season number, since
/// cached quality is tracked per season (packs cover whole seasons).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentKey {
    imdb_id: String,
    season: Option<u32>,
}

impl ContentKey {
    pub fn movie(imdb_id: impl Into<String>) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            season: None,
        }
    }

    pub fn season(imdb_id: impl Into<String>, season: u32) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            season: Some(season),
        }
    }

    pub fn imdb_id(&self) -> &str {
        &self.imdb_id
    }

    pub fn season_number(&self) -> Option<u32> {
        self.season
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.season {
            Some(season) => write!(f, "{} S{}", self.imdb_id, season),
            None => write!(f, "{}", self.imdb_id),
        }
    }
}

/// A stream as returned by the discovery backend, before parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStream {
    /// Human readable description; carries seeders, size and quality markers.
    #[serde(default)]
    pub title: String,
    /// Torrent info hash. Streams without one cannot be cached.
    #[serde(
        default,
        rename = "infoHash",
        skip_serializing_if = "Option::is_none"
    )]
    pub info_hash: Option<String>,
}

/// Structured view of one discovered torrent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamCandidate {
    pub title: String,
    /// Lowercase hex info hash.
    pub info_hash: String,
    pub seeders: u32,
    pub resolution: Resolution,
    pub size_mb: f64,
    pub is_pack: bool,
    /// Seasons covered by a pack. Empty when unknown.
    pub pack_seasons: BTreeSet<u32>,
}
