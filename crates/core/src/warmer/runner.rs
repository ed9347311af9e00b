//! Cache warmer implementation.
//!
//! Processes content items one at a time:
//! discovery, parsing and filtering, then tier selection.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::WarmerConfig;
use crate::debrid::DebridClient;
use crate::discovery::StreamSource;
use crate::metrics;
use crate::selector::{CandidatePool, SelectionThresholds, TierSelector};
use crate::store::DedupStore;
use crate::stream::{parse_raw_stream, RawStream};

use super::types::{ItemReport, PassReport, WarmError, WarmerStatus, WorkItem, WorkList};

/// Drives warm passes over a work list.
pub struct CacheWarmer {
    config: WarmerConfig,
    source: Arc<dyn StreamSource>,
    selector: TierSelector,
    status: Arc<RwLock<WarmerStatus>>,
}

impl CacheWarmer {
    pub fn new(
        config: WarmerConfig,
        source: Arc<dyn StreamSource>,
        debrid: Arc<dyn DebridClient>,
        store: Arc<dyn DedupStore>,
    ) -> Self {
        let selector = TierSelector::new(store, debrid, SelectionThresholds::from(&config));
        Self {
            config,
            source,
            selector,
            status: Arc::new(RwLock::new(WarmerStatus::default())),
        }
    }

    /// Shared status handle for observers.
    pub fn status_handle(&self) -> Arc<RwLock<WarmerStatus>> {
        Arc::clone(&self.status)
    }

    pub async fn status(&self) -> WarmerStatus {
        self.status.read().await.clone()
    }

    /// Run one pass over the work list.
    ///
    /// Item failures are logged and counted. Cancellation lets the
    /// in-flight item wind down and stops any further item from starting.
    pub async fn run_pass(&self, work: &WorkList, token: &CancellationToken) -> PassReport {
        let mut report = PassReport::started();
        info!(
            movies = work.movie_count(),
            episodes = work.episode_count(),
            "Starting warm pass"
        );

        for (index, item) in work.items().iter().enumerate() {
            if token.is_cancelled() {
                report.cancelled = true;
                report.items_skipped = work.len() - index;
                info!(remaining = report.items_skipped, "Pass cancelled");
                break;
            }

            self.status.write().await.current_item = Some(item.to_string());
            info!(item = %item, "Processing item");

            let started = Instant::now();
            match self.warm_item(item, token).await {
                Ok(item_report) => {
                    report.items_processed += 1;
                    report.submissions += item_report.outcome.submitted_count();
                    metrics::ITEMS_PROCESSED
                        .with_label_values(&[item.kind(), "ok"])
                        .inc();
                    info!(
                        item = %item,
                        streams = item_report.discovered,
                        candidates = item_report.candidates,
                        submitted = item_report.outcome.submitted_count(),
                        already_cached = item_report.outcome.already_cached,
                        "Item complete"
                    );
                }
                Err(e) => {
                    report.items_failed += 1;
                    metrics::ITEMS_PROCESSED
                        .with_label_values(&[item.kind(), "failed"])
                        .inc();
                    error!(item = %item, error = %e, "Error processing item");
                }
            }
            metrics::ITEM_DURATION
                .with_label_values(&[item.kind()])
                .observe(started.elapsed().as_secs_f64());

            self.pause_between_items(token).await;
        }

        if token.is_cancelled() {
            report.cancelled = true;
        }
        report.finished_at = Some(Utc::now());

        {
            let mut status = self.status.write().await;
            status.current_item = None;
            status.last_pass = Some(report.clone());
        }

        info!(
            processed = report.items_processed,
            failed = report.items_failed,
            skipped = report.items_skipped,
            submissions = report.submissions,
            "Warm pass finished"
        );
        report
    }

    /// Warm a single content item.
    pub async fn warm_item(
        &self,
        item: &WorkItem,
        token: &CancellationToken,
    ) -> Result<ItemReport, WarmError> {
        let streams = match item {
            WorkItem::Movie { imdb_id } => self.source.movie_streams(imdb_id).await?,
            WorkItem::Episode {
                series_id,
                season,
                episode,
            } => {
                self.source
                    .episode_streams(series_id, *season, *episode)
                    .await?
            }
        };
        let discovered = streams.len();
        metrics::STREAMS_DISCOVERED
            .with_label_values(&[item.kind()])
            .observe(discovered as f64);

        let pool = self.build_pool(streams).await;
        let candidates = pool.candidates.len();
        debug!(
            item = %item,
            candidates,
            singles_seen = pool.singles_seen,
            "Candidate pool ready"
        );

        let outcome = self
            .selector
            .select(&item.content_key(), pool, token)
            .await?;

        Ok(ItemReport {
            item: item.clone(),
            discovered,
            candidates,
            outcome,
        })
    }

    /// Cap, parse and filter raw streams.
    ///
    /// `singles_seen` is recorded before the seeder and resolution filters,
    /// so a rejected single still blocks pack fallback.
    async fn build_pool(&self, mut streams: Vec<RawStream>) -> CandidatePool {
        streams.truncate(self.config.max_streams_per_item);
        let yield_delay = Duration::from_millis(self.config.candidate_yield_ms);

        let mut pool = CandidatePool::default();
        for raw in &streams {
            if !yield_delay.is_zero() {
                tokio::time::sleep(yield_delay).await;
            }

            let Some(candidate) = parse_raw_stream(raw) else {
                continue;
            };
            if !candidate.is_pack {
                pool.singles_seen = true;
            }
            if candidate.seeders < self.config.min_seeders {
                debug!(info_hash = %candidate.info_hash, seeders = candidate.seeders, "Below seeder threshold");
                continue;
            }
            if candidate.resolution < self.config.min_resolution {
                debug!(info_hash = %candidate.info_hash, resolution = %candidate.resolution, "Below resolution threshold");
                continue;
            }
            pool.candidates.push(candidate);
        }
        pool
    }

    async fn pause_between_items(&self, token: &CancellationToken) {
        let delay = Duration::from_secs(self.config.delay_between_movies);
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
