use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, debug_span, warn};

use super::pair::{PairError, PairScorer, Verdict};
use super::DiffRecord;

/// Everything collected by one scan, read after all pair tasks have joined.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Reported pairs, in completion order until ranked.
    pub records: Vec<DiffRecord>,
    /// Left-tree files handed to the scan.
    pub scanned: usize,
    /// Pairs decoded on both sides whose bytes differed.
    pub compared: usize,
    /// Pairs skipped because both files held the same bytes.
    pub identical_bytes: usize,
    /// Left files with no counterpart in the right tree.
    pub missing: usize,
    /// Right files that exist but could not be decoded.
    pub undecodable_right: usize,
}

impl ScanSummary {
    /// Pairs that matched byte-for-byte or scored within the threshold.
    pub fn identical(&self) -> usize {
        self.identical_bytes + self.compared.saturating_sub(self.records.len())
    }
}

/// Shared between pair tasks for the duration of one scan.
struct Shared {
    scorer: PairScorer,
    threshold: f64,
    records: Mutex<Vec<DiffRecord>>,
    compared: AtomicUsize,
    identical_bytes: AtomicUsize,
    missing: AtomicUsize,
    undecodable_right: AtomicUsize,
}

impl Shared {
    fn process(&self, left: &Path) {
        let span = debug_span!("pair", path = %left.display());
        let _enter = span.enter();

        match self.scorer.score(left) {
            Ok(Verdict::IdenticalBytes) => {
                self.identical_bytes.fetch_add(1, Ordering::Relaxed);
                debug!("byte-identical");
            }
            Ok(Verdict::Compared(record)) => {
                self.compared.fetch_add(1, Ordering::Relaxed);
                if record.score > self.threshold {
                    self.records
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(record);
                }
            }
            Err(e @ PairError::MissingCounterpart { .. }) => {
                self.missing.fetch_add(1, Ordering::Relaxed);
                warn!("{e}");
            }
            Err(e @ PairError::UndecodableRight { .. }) => {
                self.undecodable_right.fetch_add(1, Ordering::Relaxed);
                warn!("{e}");
            }
            // Left-side decode failures are expected for non-image files.
            Err(e) => debug!(error = %e, "skipped"),
        }
    }
}

/// Fans out one blocking task per left-tree file and joins them all.
///
/// Pair failures stay inside their task; a panicking task is logged and
/// counts as a skipped pair.
pub struct Aggregator {
    shared: Arc<Shared>,
}

impl Aggregator {
    /// Pairs scoring at or below `threshold` are counted but not reported.
    pub fn new(scorer: PairScorer, threshold: f64) -> Self {
        Self {
            shared: Arc::new(Shared {
                scorer,
                threshold,
                records: Mutex::new(Vec::new()),
                compared: AtomicUsize::new(0),
                identical_bytes: AtomicUsize::new(0),
                missing: AtomicUsize::new(0),
                undecodable_right: AtomicUsize::new(0),
            }),
        }
    }

    /// Score every path, wait for all tasks, then hand back the totals.
    pub async fn run<I>(self, paths: I) -> ScanSummary
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut set = JoinSet::new();
        let mut scanned = 0usize;
        for path in paths {
            scanned += 1;
            let shared = Arc::clone(&self.shared);
            set.spawn_blocking(move || shared.process(&path));
        }
        debug!(tasks = scanned, "waiting for pair tasks");

        while let Some(result) = set.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "pair task panicked");
            }
        }

        let shared = &self.shared;
        let records = std::mem::take(
            &mut *shared
                .records
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        ScanSummary {
            records,
            scanned,
            compared: shared.compared.load(Ordering::Relaxed),
            identical_bytes: shared.identical_bytes.load(Ordering::Relaxed),
            missing: shared.missing.load(Ordering::Relaxed),
            undecodable_right: shared.undecodable_right.load(Ordering::Relaxed),
        }
    }
}
