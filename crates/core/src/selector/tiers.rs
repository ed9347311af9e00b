//! Tier selector implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::debrid::{magnet_uri, CacheStatus, DebridClient};
use crate::metrics;
use crate::store::{DedupStore, StoreError};
use crate::stream::{ContentKey, Resolution, StreamCandidate};

use super::types::{CandidateKind, CandidatePool, SelectionOutcome, SelectionThresholds, Submission};

/// Chooses and submits candidates for one content item.
pub struct TierSelector {
    store: Arc<dyn DedupStore>,
    debrid: Arc<dyn DebridClient>,
    thresholds: SelectionThresholds,
}

/// Result of running the submission protocol on one candidate.
enum Attempt {
    /// Accepted by the provider; counts toward the tier quota.
    Submitted,
    /// Nothing to count: already decided, cached upstream, unknown or rejected.
    Skipped,
}

impl TierSelector {
    pub fn new(
        store: Arc<dyn DedupStore>,
        debrid: Arc<dyn DebridClient>,
        thresholds: SelectionThresholds,
    ) -> Self {
        Self {
            store,
            debrid,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> SelectionThresholds {
        self.thresholds
    }

    /// Run selection for one item.
    ///
    /// The token is checked before each tier and each candidate. A store
    /// failure aborts the item; marks written before it stay in place.
    pub async fn select(
        &self,
        key: &ContentKey,
        pool: CandidatePool,
        token: &CancellationToken,
    ) -> Result<SelectionOutcome, StoreError> {
        let CandidatePool {
            candidates,
            singles_seen,
        } = pool;
        let (singles, packs): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|c| !c.is_pack);

        let mut outcome = SelectionOutcome::default();
        self.process_tiers(key, singles, CandidateKind::Single, token, &mut outcome)
            .await?;
        if outcome.cancelled {
            return Ok(outcome);
        }

        if !self.thresholds.allow_pack_fallback || singles_seen {
            if !packs.is_empty() {
                debug!(item = %key, packs = packs.len(), "Pack fallback not applicable");
            }
            return Ok(outcome);
        }

        let packs = self.drop_covered_packs(key, packs)?;
        outcome.pack_fallback = true;
        debug!(item = %key, packs = packs.len(), "Falling back to packs");
        self.process_tiers(key, packs, CandidateKind::Pack, token, &mut outcome)
            .await?;

        Ok(outcome)
    }

    async fn process_tiers(
        &self,
        key: &ContentKey,
        candidates: Vec<StreamCandidate>,
        kind: CandidateKind,
        token: &CancellationToken,
        outcome: &mut SelectionOutcome,
    ) -> Result<(), StoreError> {
        for (tier, mut items) in group_by_tier(candidates).into_iter().rev() {
            if token.is_cancelled() {
                outcome.cancelled = true;
                return Ok(());
            }

            if self
                .store
                .has_cached_quality(key.imdb_id(), tier, key.season_number())?
            {
                debug!(item = %key, resolution = %tier, "Tier already cached, skipping");
                continue;
            }

            sort_for_submission(&mut items);

            let mut accepted = 0;
            for candidate in &items {
                if accepted >= self.thresholds.max_per_quality {
                    break;
                }
                if token.is_cancelled() {
                    outcome.cancelled = true;
                    return Ok(());
                }

                if let Attempt::Submitted = self.attempt(key, candidate, kind, outcome).await? {
                    accepted += 1;
                }
            }
        }

        Ok(())
    }

    /// Check, submit and record one candidate.
    async fn attempt(
        &self,
        key: &ContentKey,
        candidate: &StreamCandidate,
        kind: CandidateKind,
        outcome: &mut SelectionOutcome,
    ) -> Result<Attempt, StoreError> {
        let hash = candidate.info_hash.as_str();

        if self.store.has_attempted(hash)? {
            debug!(info_hash = %hash, "Already attempted, skipping");
            return Ok(Attempt::Skipped);
        }

        let status = self.debrid.check_cached(hash).await;
        metrics::CACHE_CHECKS
            .with_label_values(&[status.as_str()])
            .inc();

        match status {
            CacheStatus::Cached => {
                debug!(info_hash = %hash, resolution = %candidate.resolution, "Already cached upstream");
                self.store.mark_attempted(hash)?;
                outcome.already_cached += 1;
                Ok(Attempt::Skipped)
            }
            CacheStatus::Unknown => {
                warn!(info_hash = %hash, "Cache status unknown, leaving unmarked");
                outcome.unknown += 1;
                Ok(Attempt::Skipped)
            }
            CacheStatus::NotCached => match self.debrid.submit_magnet(&magnet_uri(hash)).await {
                Ok(()) => {
                    self.store.record_submission(
                        hash,
                        key.imdb_id(),
                        candidate.resolution,
                        &satisfied_seasons(key, candidate, kind),
                    )?;
                    metrics::SUBMISSIONS
                        .with_label_values(&[kind.as_str(), "success"])
                        .inc();
                    info!(
                        item = %key,
                        info_hash = %hash,
                        resolution = %candidate.resolution,
                        kind = kind.as_str(),
                        title = %candidate.title.lines().next().unwrap_or_default(),
                        "Submitted magnet"
                    );
                    outcome.submitted.push(Submission {
                        info_hash: hash.to_string(),
                        resolution: candidate.resolution,
                        kind,
                    });
                    Ok(Attempt::Submitted)
                }
                Err(e) => {
                    metrics::SUBMISSIONS
                        .with_label_values(&[kind.as_str(), "failed"])
                        .inc();
                    warn!(info_hash = %hash, error = %e, "Magnet submission failed");
                    outcome.failed += 1;
                    Ok(Attempt::Skipped)
                }
            },
        }
    }

    /// Drop packs whose parsed seasons are all cached at the pack's tier.
    /// Only applies to season jobs.
    fn drop_covered_packs(
        &self,
        key: &ContentKey,
        packs: Vec<StreamCandidate>,
    ) -> Result<Vec<StreamCandidate>, StoreError> {
        if key.season_number().is_none() {
            return Ok(packs);
        }

        let mut kept = Vec::with_capacity(packs.len());
        for pack in packs {
            if self.fully_covered(key.imdb_id(), &pack)? {
                debug!(info_hash = %pack.info_hash, "Pack seasons already cached, skipping");
                continue;
            }
            kept.push(pack);
        }
        Ok(kept)
    }

    fn fully_covered(&self, imdb_id: &str, pack: &StreamCandidate) -> Result<bool, StoreError> {
        if pack.pack_seasons.is_empty() {
            return Ok(false);
        }
        for season in &pack.pack_seasons {
            if !self
                .store
                .has_cached_quality(imdb_id, pack.resolution, Some(*season))?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Seasons whose tier a successful submission satisfies.
///
/// A pack with parsed seasons, in a season job, satisfies every season it
/// covers. Everything else satisfies the job's own key.
fn satisfied_seasons(
    key: &ContentKey,
    candidate: &StreamCandidate,
    kind: CandidateKind,
) -> Vec<Option<u32>> {
    if kind == CandidateKind::Pack
        && key.season_number().is_some()
        && !candidate.pack_seasons.is_empty()
    {
        return candidate.pack_seasons.iter().map(|s| Some(*s)).collect();
    }
    vec![key.season_number()]
}

fn group_by_tier(candidates: Vec<StreamCandidate>) -> BTreeMap<Resolution, Vec<StreamCandidate>> {
    let mut tiers: BTreeMap<Resolution, Vec<StreamCandidate>> = BTreeMap::new();
    for candidate in candidates {
        tiers.entry(candidate.resolution).or_default().push(candidate);
    }
    tiers
}

/// Most seeders first; smaller size breaks ties.
fn sort_for_submission(items: &mut [StreamCandidate]) {
    items.sort_by(|a, b| {
        b.seeders
            .cmp(&a.seeders)
            .then_with(|| a.size_mb.total_cmp(&b.size_mb))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteDedupStore;
    use crate::testing::fixtures::{candidate, hash, pack_candidate};
    use crate::testing::MockDebridClient;

    struct Harness {
        store: Arc<SqliteDedupStore>,
        debrid: Arc<MockDebridClient>,
        selector: TierSelector,
    }

    fn harness(max_per_quality: u32, allow_pack_fallback: bool) -> Harness {
        let store = Arc::new(SqliteDedupStore::in_memory().unwrap());
        let debrid = Arc::new(MockDebridClient::new());
        let selector = TierSelector::new(
            store.clone(),
            debrid.clone(),
            SelectionThresholds {
                max_per_quality,
                allow_pack_fallback,
            },
        );
        Harness {
            store,
            debrid,
            selector,
        }
    }

    fn singles_pool(candidates: Vec<StreamCandidate>) -> CandidatePool {
        CandidatePool::new(candidates, true)
    }

    #[tokio::test]
    async fn test_tiers_submitted_highest_first() {
        let h = harness(1, true);
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![
            candidate(&hash(480), Resolution::Sd, 50, 700.0),
            candidate(&hash(1080), Resolution::FullHd, 50, 2000.0),
            candidate(&hash(2160), Resolution::Uhd, 50, 20000.0),
            candidate(&hash(720), Resolution::Hd, 50, 1000.0),
        ]);

        let outcome = h
            .selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            h.debrid.submitted_hashes().await,
            vec![hash(2160), hash(1080), hash(720), hash(480)]
        );
        let tiers: Vec<Resolution> = outcome.submitted.iter().map(|s| s.resolution).collect();
        assert_eq!(
            tiers,
            vec![Resolution::Uhd, Resolution::FullHd, Resolution::Hd, Resolution::Sd]
        );
        for tier in Resolution::TIERS_DESC {
            assert!(h.store.has_cached_quality("tt0111161", tier, None).unwrap());
        }
    }

    #[tokio::test]
    async fn test_cached_tier_is_skipped() {
        let h = harness(1, true);
        h.store
            .mark_cached_quality("tt0111161", Resolution::FullHd, None)
            .unwrap();
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![
            candidate(&hash(1), Resolution::FullHd, 90, 2000.0),
            candidate(&hash(2), Resolution::Hd, 40, 1000.0),
        ]);

        h.selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(h.debrid.checked_hashes().await, vec![hash(2)]);
        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(2)]);
    }

    #[tokio::test]
    async fn test_seeders_beat_size() {
        let h = harness(1, true);
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![
            candidate(&hash(10), Resolution::FullHd, 10, 1200.0),
            candidate(&hash(25), Resolution::FullHd, 25, 4000.0),
        ]);

        h.selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(25)]);
    }

    #[tokio::test]
    async fn test_smaller_size_breaks_seeder_tie() {
        let h = harness(1, true);
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![
            candidate(&hash(1), Resolution::FullHd, 30, 8000.0),
            candidate(&hash(2), Resolution::FullHd, 30, 2500.0),
        ]);

        h.selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(2)]);
    }

    #[tokio::test]
    async fn test_quota_per_tier() {
        let h = harness(2, true);
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![
            candidate(&hash(1), Resolution::FullHd, 30, 1000.0),
            candidate(&hash(2), Resolution::FullHd, 20, 1000.0),
            candidate(&hash(3), Resolution::FullHd, 10, 1000.0),
        ]);

        let outcome = h
            .selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.submitted_count(), 2);
        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(1), hash(2)]);
        assert!(!h.store.has_attempted(&hash(3)).unwrap());
    }

    #[tokio::test]
    async fn test_second_run_submits_nothing() {
        let h = harness(1, true);
        let key = ContentKey::season("tt0944947", 1);
        let candidates = vec![
            candidate(&hash(1), Resolution::Uhd, 30, 9000.0),
            candidate(&hash(2), Resolution::FullHd, 30, 3000.0),
            candidate(&hash(3), Resolution::Hd, 30, 1000.0),
        ];

        let first = h
            .selector
            .select(&key, singles_pool(candidates.clone()), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(first.submitted_count(), 3);

        h.debrid.clear_recorded().await;
        let second = h
            .selector
            .select(&key, singles_pool(candidates), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(second.submitted_count(), 0);
        assert_eq!(h.debrid.submission_count().await, 0);
        assert!(h.debrid.checked_hashes().await.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_cached_does_not_fill_quota() {
        let h = harness(1, true);
        h.debrid.set_status(&hash(1), CacheStatus::Cached).await;
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![
            candidate(&hash(1), Resolution::FullHd, 90, 2000.0),
            candidate(&hash(2), Resolution::FullHd, 40, 2000.0),
        ]);

        let outcome = h
            .selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.already_cached, 1);
        assert!(h.store.has_attempted(&hash(1)).unwrap());
        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(2)]);
    }

    #[tokio::test]
    async fn test_unknown_status_leaves_no_marks() {
        let h = harness(1, true);
        h.debrid.set_status(&hash(1), CacheStatus::Unknown).await;
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![candidate(&hash(1), Resolution::FullHd, 90, 2000.0)]);

        let outcome = h
            .selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.unknown, 1);
        assert_eq!(h.debrid.submission_count().await, 0);
        assert!(!h.store.has_attempted(&hash(1)).unwrap());
        assert!(!h
            .store
            .has_cached_quality("tt0111161", Resolution::FullHd, None)
            .unwrap());
        assert_eq!(h.store.stats().unwrap().attempted_hashes, 0);
        assert_eq!(h.store.stats().unwrap().cached_qualities, 0);
    }

    #[tokio::test]
    async fn test_failed_submission_tries_next_candidate() {
        let h = harness(1, true);
        h.debrid.fail_submission(&hash(1)).await;
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![
            candidate(&hash(1), Resolution::FullHd, 90, 2000.0),
            candidate(&hash(2), Resolution::FullHd, 40, 2000.0),
        ]);

        let outcome = h
            .selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.failed, 1);
        assert!(!h.store.has_attempted(&hash(1)).unwrap());
        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(2)]);
    }

    #[tokio::test]
    async fn test_attempted_hash_not_rechecked() {
        let h = harness(1, true);
        h.store.mark_attempted(&hash(1)).unwrap();
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![
            candidate(&hash(1), Resolution::FullHd, 90, 2000.0),
            candidate(&hash(2), Resolution::FullHd, 40, 2000.0),
        ]);

        h.selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(h.debrid.checked_hashes().await, vec![hash(2)]);
    }

    #[tokio::test]
    async fn test_packs_ignored_when_any_single_existed() {
        let h = harness(1, true);
        let key = ContentKey::season("tt0944947", 1);
        // The only single was filtered out upstream for low seeders.
        let pool = CandidatePool::new(
            vec![pack_candidate(&hash(1), Resolution::FullHd, 80, &[1, 2])],
            true,
        );

        let outcome = h
            .selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!outcome.pack_fallback);
        assert_eq!(h.debrid.submission_count().await, 0);
        assert!(h.debrid.checked_hashes().await.is_empty());
    }

    #[tokio::test]
    async fn test_packs_used_when_no_single_existed() {
        let h = harness(1, true);
        let key = ContentKey::movie("tt0111161");
        let pool = CandidatePool::new(
            vec![
                pack_candidate(&hash(1), Resolution::Hd, 80, &[]),
                pack_candidate(&hash(2), Resolution::FullHd, 20, &[]),
            ],
            false,
        );

        let outcome = h
            .selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.pack_fallback);
        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(2), hash(1)]);
        assert!(outcome.submitted.iter().all(|s| s.kind == CandidateKind::Pack));
        assert!(h
            .store
            .has_cached_quality("tt0111161", Resolution::FullHd, None)
            .unwrap());
    }

    #[tokio::test]
    async fn test_pack_fallback_disabled() {
        let h = harness(1, false);
        let key = ContentKey::movie("tt0111161");
        let pool = CandidatePool::new(
            vec![pack_candidate(&hash(1), Resolution::FullHd, 80, &[])],
            false,
        );

        h.selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(h.debrid.submission_count().await, 0);
    }

    #[tokio::test]
    async fn test_pack_marks_every_covered_season() {
        let h = harness(1, true);
        let key = ContentKey::season("tt0944947", 2);
        let pool = CandidatePool::new(
            vec![pack_candidate(&hash(1), Resolution::FullHd, 80, &[1, 2, 3])],
            false,
        );

        h.selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        for season in [1, 2, 3] {
            assert!(h
                .store
                .has_cached_quality("tt0944947", Resolution::FullHd, Some(season))
                .unwrap());
        }
        assert!(!h
            .store
            .has_cached_quality("tt0944947", Resolution::FullHd, Some(4))
            .unwrap());
        assert!(!h
            .store
            .has_cached_quality("tt0944947", Resolution::FullHd, None)
            .unwrap());
    }

    #[tokio::test]
    async fn test_pack_without_seasons_marks_job_season() {
        let h = harness(1, true);
        let key = ContentKey::season("tt0944947", 4);
        let pool = CandidatePool::new(
            vec![pack_candidate(&hash(1), Resolution::Hd, 80, &[])],
            false,
        );

        h.selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert!(h
            .store
            .has_cached_quality("tt0944947", Resolution::Hd, Some(4))
            .unwrap());
    }

    #[tokio::test]
    async fn test_fully_covered_pack_skipped() {
        let h = harness(1, true);
        h.store
            .mark_cached_quality("tt0944947", Resolution::FullHd, Some(1))
            .unwrap();
        h.store
            .mark_cached_quality("tt0944947", Resolution::FullHd, Some(2))
            .unwrap();
        let key = ContentKey::season("tt0944947", 3);
        let pool = CandidatePool::new(
            vec![
                pack_candidate(&hash(1), Resolution::FullHd, 90, &[1, 2]),
                pack_candidate(&hash(2), Resolution::FullHd, 10, &[2, 3]),
            ],
            false,
        );

        h.selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(h.debrid.checked_hashes().await, vec![hash(2)]);
        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(2)]);
    }

    #[tokio::test]
    async fn test_movie_pack_not_skipped_by_season_coverage() {
        let h = harness(1, true);
        h.store
            .mark_cached_quality("tt0120737", Resolution::FullHd, Some(1))
            .unwrap();
        h.store
            .mark_cached_quality("tt0120737", Resolution::FullHd, Some(2))
            .unwrap();
        let key = ContentKey::movie("tt0120737");
        let pool = CandidatePool::new(
            vec![pack_candidate(&hash(1), Resolution::FullHd, 90, &[1, 2])],
            false,
        );

        let outcome = h
            .selector
            .select(&key, pool, &CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.pack_fallback);
        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(1)]);
        assert!(h
            .store
            .has_cached_quality("tt0120737", Resolution::FullHd, None)
            .unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_any_check() {
        let h = harness(1, true);
        let key = ContentKey::movie("tt0111161");
        let token = CancellationToken::new();
        token.cancel();

        let outcome = h
            .selector
            .select(
                &key,
                singles_pool(vec![candidate(&hash(1), Resolution::FullHd, 90, 2000.0)]),
                &token,
            )
            .await
            .unwrap();

        assert!(outcome.cancelled);
        assert!(h.debrid.checked_hashes().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_selection_keeps_earlier_marks() {
        let h = harness(1, true);
        let token = CancellationToken::new();
        h.debrid.cancel_on_submit(token.clone()).await;
        let key = ContentKey::movie("tt0111161");
        let pool = singles_pool(vec![
            candidate(&hash(1), Resolution::Uhd, 90, 20000.0),
            candidate(&hash(2), Resolution::FullHd, 90, 2000.0),
        ]);

        let outcome = h.selector.select(&key, pool, &token).await.unwrap();

        assert!(outcome.cancelled);
        assert_eq!(h.debrid.submitted_hashes().await, vec![hash(1)]);
        assert!(h.store.has_attempted(&hash(1)).unwrap());
    }
}
