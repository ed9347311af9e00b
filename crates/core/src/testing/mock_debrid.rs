//! Mock debrid client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::debrid::{CacheStatus, DebridClient, DebridError};

/// Mock implementation of the DebridClient trait.
///
/// Provides controllable behavior for testing:
/// - Scripted cache status per info hash (default `NotCached`)
/// - Submissions that fail for chosen hashes
/// - Recorded cache checks and submissions for assertions
/// - Cancelling a token when a magnet is submitted, to stop a pass mid-item
///
/// # Example
///
/// ```rust,ignore
/// use cachewarmer_core::testing::MockDebridClient;
///
/// let debrid = MockDebridClient::new();
/// debrid.set_status("abc", CacheStatus::Cached).await;
/// debrid.fail_submission("def").await;
///
/// // ... run a selection ...
///
/// assert_eq!(debrid.submitted_hashes().await, vec!["ghi".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MockDebridClient {
    statuses: Arc<RwLock<HashMap<String, CacheStatus>>>,
    failing_submissions: Arc<RwLock<HashSet<String>>>,
    checks: Arc<RwLock<Vec<String>>>,
    submissions: Arc<RwLock<Vec<String>>>,
    /// If set, the next `verify_connection` fails with this error.
    next_verify_error: Arc<RwLock<Option<DebridError>>>,
    /// Cancelled on every successful submission.
    cancel_on_submit: Arc<RwLock<Option<CancellationToken>>>,
}

impl MockDebridClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the cache status returned for a hash.
    pub async fn set_status(&self, info_hash: &str, status: CacheStatus) {
        self.statuses
            .write()
            .await
            .insert(info_hash.to_lowercase(), status);
    }

    /// Make submissions of this hash fail.
    pub async fn fail_submission(&self, info_hash: &str) {
        self.failing_submissions
            .write()
            .await
            .insert(info_hash.to_lowercase());
    }

    /// Configure the next connection check to fail with the given error.
    pub async fn set_verify_error(&self, error: DebridError) {
        *self.next_verify_error.write().await = Some(error);
    }

    /// Cancel `token` whenever a magnet is accepted.
    pub async fn cancel_on_submit(&self, token: CancellationToken) {
        *self.cancel_on_submit.write().await = Some(token);
    }

    /// Hashes passed to `check_cached`, in call order.
    pub async fn checked_hashes(&self) -> Vec<String> {
        self.checks.read().await.clone()
    }

    /// Hashes of accepted submissions, in call order.
    pub async fn submitted_hashes(&self) -> Vec<String> {
        self.submissions.read().await.clone()
    }

    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }

    pub async fn clear_recorded(&self) {
        self.checks.write().await.clear();
        self.submissions.write().await.clear();
    }
}

fn hash_from_magnet(magnet: &str) -> String {
    magnet
        .strip_prefix("magnet:?xt=urn:btih:")
        .unwrap_or(magnet)
        .to_lowercase()
}

#[async_trait]
impl DebridClient for MockDebridClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn verify_connection(&self) -> Result<(), DebridError> {
        match self.next_verify_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn check_cached(&self, info_hash: &str) -> CacheStatus {
        self.checks.write().await.push(info_hash.to_string());
        self.statuses
            .read()
            .await
            .get(&info_hash.to_lowercase())
            .copied()
            .unwrap_or(CacheStatus::NotCached)
    }

    async fn submit_magnet(&self, magnet: &str) -> Result<(), DebridError> {
        let hash = hash_from_magnet(magnet);
        if self.failing_submissions.read().await.contains(&hash) {
            return Err(DebridError::ApiError(format!(
                "HTTP 503 Service Unavailable: rejected {}",
                hash
            )));
        }

        self.submissions.write().await.push(hash);
        if let Some(token) = self.cancel_on_submit.read().await.as_ref() {
            token.cancel();
        }
        Ok(())
    }
}
