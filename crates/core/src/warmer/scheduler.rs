//! Run scheduler: repeats warm passes according to the run mode.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{RunMode, ScheduleConfig};
use crate::metrics;

use super::runner::CacheWarmer;
use super::types::{PassReport, WorkList};

/// Totals over every pass of one scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub passes: u64,
    pub items_processed: usize,
    pub items_failed: usize,
    pub submissions: usize,
    pub cancelled: bool,
}

impl RunSummary {
    fn absorb(&mut self, report: &PassReport) {
        self.passes += 1;
        self.items_processed += report.items_processed;
        self.items_failed += report.items_failed;
        self.submissions += report.submissions;
    }
}

pub struct Scheduler {
    warmer: Arc<CacheWarmer>,
    work: WorkList,
    schedule: ScheduleConfig,
}

impl Scheduler {
    pub fn new(warmer: Arc<CacheWarmer>, work: WorkList, schedule: ScheduleConfig) -> Self {
        Self {
            warmer,
            work,
            schedule,
        }
    }

    /// Run passes until the mode is exhausted or the token is cancelled.
    pub async fn run(&self, token: &CancellationToken) -> RunSummary {
        let mode = self.schedule.run_mode;
        let status = self.warmer.status_handle();
        {
            let mut status = status.write().await;
            status.running = true;
            status.started_at = Some(Utc::now());
        }
        info!(mode = %mode, items = self.work.len(), "Scheduler started");

        let mut summary = RunSummary::default();
        loop {
            let report = self.warmer.run_pass(&self.work, token).await;
            summary.absorb(&report);
            metrics::PASSES_COMPLETED
                .with_label_values(&[mode.as_str()])
                .inc();
            status.write().await.passes_completed += 1;

            if token.is_cancelled() {
                break;
            }
            match mode {
                RunMode::Oneshot => break,
                RunMode::Loop => info!("Loop: starting next pass"),
                RunMode::Interval => {
                    if !self.wait_for_next_pass(token).await {
                        break;
                    }
                }
            }
        }

        summary.cancelled = token.is_cancelled();
        {
            let mut status = status.write().await;
            status.running = false;
            status.current_item = None;
        }
        info!(
            passes = summary.passes,
            submissions = summary.submissions,
            cancelled = summary.cancelled,
            "Scheduler stopped"
        );
        summary
    }

    /// Sleep `repeat_minutes` in one-second ticks. Returns false if cancelled.
    async fn wait_for_next_pass(&self, token: &CancellationToken) -> bool {
        let minutes = self.schedule.repeat_minutes.max(1);
        info!(minutes, "Next run scheduled");

        for _ in 0..minutes.saturating_mul(60) {
            if token.is_cancelled() {
                return false;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        !token.is_cancelled()
    }
}
