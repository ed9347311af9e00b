//! Stream title parsing.
//!
//! Discovery backends describe each torrent with a free-form title such as
//! `"Movie.2020.1080p.BluRay.x264\n👤 42 💾 8.1 GB ⚙️ 1337x"`. Everything the
//! selector needs is derived from that string here, so selection never looks
//! at titles again. All functions are total: anything unparsable falls back
//! to a neutral default.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::{RawStream, Resolution, StreamCandidate};

/// Low quality source tags. Matched as plain substrings.
const BLACKLIST: &[&str] = &["cam", "ts", "telesync", "hdcam"];

/// Markers of standard-definition rips. These win over any resolution number.
const SD_MARKERS: &[&str] = &["dvd", "xvid", "divx", "camrip", "dvdrip"];
const UHD_MARKERS: &[&str] = &["2160p", "4k", "uhd", "3840x2160"];
const FULL_HD_MARKERS: &[&str] = &["1080p", "1080 px", "1920x1080"];
const HD_MARKERS: &[&str] = &["720p", "1280x720"];

/// Phrases that mark a bundle rather than a single title.
const PACK_MARKERS: &[&str] = &[
    "500 movies",
    "200 movies",
    "100 movies",
    "complete movies",
    "movie pack",
    "mega pack",
    "collection",
    "trilogy",
    "quadrilogy",
    "pack",
    "great films",
    "essential films",
    "classic films",
    "movies part",
    "part 1 of",
    "part 2 of",
    "m1 ",
    " m2 ",
    " m3 ",
];

static SEEDERS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"👤\s*(\d+)").unwrap());
static SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"💾\s*([\d.]+)\s*(GB|MB)").unwrap());

// S01-S03, S1-S3, S01 - 03
static SEASON_CODE_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})\s*-\s*S?(\d{1,2})\b").unwrap());
// Season 1-3, Season 1 – 3
static SEASON_WORD_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSeason\s+(\d{1,2})\s*[-–]\s*(\d{1,2})\b").unwrap());
// S01 as a whole word (S01E02 does not match)
static SEASON_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})\b").unwrap());
// Season 1, Complete Season 1
static SEASON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSeason\s+(\d{1,2})\b").unwrap());

/// Seeder count following the `👤` glyph, or 0. Counts too large for
/// `u32` saturate.
pub fn extract_seeders(title: &str) -> u32 {
    SEEDERS_RE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().parse().unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Resolution tier from title markers.
///
/// Standard-definition markers are checked first: a DVD rip that also
/// mentions "1080p" is still treated as 480.
pub fn extract_resolution(title: &str) -> Resolution {
    let t = title.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| t.contains(m));

    if has_any(SD_MARKERS) {
        Resolution::Sd
    } else if has_any(UHD_MARKERS) {
        Resolution::Uhd
    } else if has_any(FULL_HD_MARKERS) {
        Resolution::FullHd
    } else if has_any(HD_MARKERS) {
        Resolution::Hd
    } else {
        Resolution::Unknown
    }
}

/// Size in megabytes from the `💾` field. GB values are scaled by 1024.
pub fn extract_size_mb(title: &str) -> f64 {
    let Some(caps) = SIZE_RE.captures(title) else {
        return 0.0;
    };
    let Ok(size) = caps[1].parse::<f64>() else {
        return 0.0;
    };
    match &caps[2] {
        "GB" => size * 1024.0,
        _ => size,
    }
}

/// Whether the title carries a low quality source tag.
pub fn is_blacklisted(title: &str) -> bool {
    let t = title.to_lowercase();
    BLACKLIST.iter().any(|word| t.contains(word))
}

/// Whether the title describes a bundle of several items.
pub fn is_pack(title: &str) -> bool {
    let t = title.to_lowercase();
    PACK_MARKERS.iter().any(|marker| t.contains(marker))
}

/// Season numbers named in the title, as a sorted set.
///
/// Ranges are inclusive and every match is unioned in, so
/// `"S01-S02 + Season 4"` yields `{1, 2, 4}`.
pub fn extract_pack_seasons(title: &str) -> BTreeSet<u32> {
    let mut seasons = BTreeSet::new();

    for re in [&*SEASON_CODE_RANGE_RE, &*SEASON_WORD_RANGE_RE] {
        for caps in re.captures_iter(title) {
            let (Ok(a), Ok(b)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
                continue;
            };
            seasons.extend(a.min(b)..=a.max(b));
        }
    }

    for re in [&*SEASON_CODE_RE, &*SEASON_WORD_RE] {
        for caps in re.captures_iter(title) {
            if let Ok(n) = caps[1].parse::<u32>() {
                seasons.insert(n);
            }
        }
    }

    seasons
}

/// Build a candidate from a title and hash. Never fails.
pub fn parse_stream(title: &str, info_hash: &str) -> StreamCandidate {
    let is_pack = is_pack(title);
    StreamCandidate {
        title: title.to_string(),
        info_hash: info_hash.to_lowercase(),
        seeders: extract_seeders(title),
        resolution: extract_resolution(title),
        size_mb: extract_size_mb(title),
        is_pack,
        pack_seasons: if is_pack {
            extract_pack_seasons(title)
        } else {
            BTreeSet::new()
        },
    }
}

/// Turn a discovered stream into a candidate.
///
/// Returns `None` for streams that can never be cached: no info hash, or a
/// blacklisted source tag in the title.
pub fn parse_raw_stream(raw: &RawStream) -> Option<StreamCandidate> {
    let hash = raw.info_hash.as_deref().map(str::trim).unwrap_or_default();
    if hash.is_empty() || is_blacklisted(&raw.title) {
        return None;
    }
    Some(parse_stream(&raw.title, hash))
}
