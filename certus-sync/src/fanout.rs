//! Fan-out of one per-key operation over many independent keys.
//!
//! Keys are synchronized concurrently with all-settled semantics: a failing
//! key never cancels or delays its siblings. Failures are collapsed into one
//! notice so that a correlated outage does not produce one notice per key.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use certus_core::{CertusError, CertusResult, ResourceKey, SyncError};
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::notify::{Notice, Notifier};

/// Per-key outcome of a fan-out.
#[derive(Debug, Clone)]
pub struct FanOutReport<K> {
    pub succeeded: Vec<K>,
    pub failed: Vec<(K, CertusError)>,
    /// Keys left out because they were in the excluded set.
    pub skipped: Vec<K>,
}

impl<K> FanOutReport<K> {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of keys the operation actually ran for.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn into_result(self) -> CertusResult<()> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(SyncError::FanOutFailed {
                failed: self.failed.len(),
                total: self.attempted(),
            }
            .into())
        }
    }
}

/// Run `per_key` for every key not in `excluded` and wait for all of them.
///
/// No notices are raised here; see [`FanOut::run`] for that.
pub async fn settle_all<K, F, Fut>(keys: &[K], excluded: &HashSet<K>, per_key: F) -> FanOutReport<K>
where
    K: ResourceKey,
    F: Fn(K) -> Fut,
    Fut: Future<Output = CertusResult<()>>,
{
    let (skipped, pending): (Vec<K>, Vec<K>) =
        keys.iter().cloned().partition(|key| excluded.contains(key));

    let runs = pending.into_iter().map(|key| {
        let run = per_key(key.clone());
        async move { (key, run.await) }
    });

    let mut report = FanOutReport {
        succeeded: Vec::new(),
        failed: Vec::new(),
        skipped,
    };
    for (key, outcome) in join_all(runs).await {
        match outcome {
            Ok(()) => report.succeeded.push(key),
            Err(err) => report.failed.push((key, err)),
        }
    }
    report
}

/// Fan-out that reports failures as a single aggregate notice.
#[derive(Clone)]
pub struct FanOut {
    notifier: Arc<dyn Notifier>,
    error_message: String,
}

impl FanOut {
    /// `error_message` is what the user sees when any key fails.
    pub fn new(notifier: Arc<dyn Notifier>, error_message: impl Into<String>) -> Self {
        Self {
            notifier,
            error_message: error_message.into(),
        }
    }

    pub async fn run<K, F, Fut>(&self, keys: &[K], excluded: &HashSet<K>, per_key: F) -> FanOutReport<K>
    where
        K: ResourceKey,
        F: Fn(K) -> Fut,
        Fut: Future<Output = CertusResult<()>>,
    {
        let report = settle_all(keys, excluded, per_key).await;

        if report.is_clean() {
            debug!(
                synced = report.succeeded.len(),
                skipped = report.skipped.len(),
                "fan-out settled"
            );
            return report;
        }

        let failed_keys: Vec<String> = report.failed.iter().map(|(key, _)| key.to_string()).collect();
        warn!(
            failed = report.failed.len(),
            total = report.attempted(),
            keys = ?failed_keys,
            "fan-out settled with failures"
        );
        self.notifier.notify(Notice::error(format!(
            "{} ({} of {} failed)",
            self.error_message,
            report.failed.len(),
            report.attempted()
        )));
        report
    }
}
