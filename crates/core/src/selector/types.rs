//! Types for tier selection.

use serde::Serialize;

use crate::config::WarmerConfig;
use crate::stream::{Resolution, StreamCandidate};

/// Limits applied while choosing what to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionThresholds {
    /// Accepted submissions per tier per item.
    pub max_per_quality: u32,
    /// Whether packs may be submitted when an item has no single at all.
    pub allow_pack_fallback: bool,
}

impl From<&WarmerConfig> for SelectionThresholds {
    fn from(config: &WarmerConfig) -> Self {
        Self {
            max_per_quality: config.max_per_quality,
            allow_pack_fallback: config.allow_packs_fallback,
        }
    }
}

/// Candidates for one content item after threshold filtering.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    pub candidates: Vec<StreamCandidate>,
    /// Whether any single existed before filtering. Disables pack fallback.
    pub singles_seen: bool,
}

impl CandidatePool {
    pub fn new(candidates: Vec<StreamCandidate>, singles_seen: bool) -> Self {
        Self {
            candidates,
            singles_seen,
        }
    }
}

/// Whether a candidate is a single release or a multi-title pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Single,
    Pack,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::Single => "single",
            CandidateKind::Pack => "pack",
        }
    }
}

/// A magnet accepted by the debrid provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub info_hash: String,
    pub resolution: Resolution,
    pub kind: CandidateKind,
}

/// What one selection run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionOutcome {
    /// Accepted submissions, in submission order.
    pub submitted: Vec<Submission>,
    /// Candidates the provider already had cached.
    pub already_cached: usize,
    /// Cache checks that could not be answered.
    pub unknown: usize,
    /// Submissions the provider rejected.
    pub failed: usize,
    /// Whether packs were considered.
    pub pack_fallback: bool,
    /// Whether cancellation cut selection short.
    pub cancelled: bool,
}

impl SelectionOutcome {
    pub fn submitted_count(&self) -> usize {
        self.submitted.len()
    }
}
