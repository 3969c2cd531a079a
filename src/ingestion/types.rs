//! Ingestion Data Types
//!
//! Reports, states and policies shared by the backfill and stream ingestors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Upper bound of the random jitter added to each backoff delay.
pub const MAX_JITTER_MS: u64 = 50;

/// A feed session that stays up this long resets the backoff.
pub const STABLE_SESSION: Duration = Duration::from_secs(30);

/// Outcome of one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Page requests that succeeded.
    pub pages: usize,
    /// Documents handed to the pipeline.
    pub documents: usize,
    /// `false` if a request failed and the remaining pages were skipped.
    pub completed: bool,
}

/// Lifecycle of the stream ingestor.
///
/// `Unconfigured -> RuleInstalled -> Streaming <-> Reconnecting`. There is no
/// terminal state; a failed rule installation stops the ingestor before `RuleInstalled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Unconfigured,
    RuleInstalled,
    Streaming,
    Reconnecting,
}

/// How long to wait before re-opening the feed after a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Re-open right away.
    Immediate,
    /// Exponential backoff on consecutive failed sessions, capped at `max`, plus jitter.
    Backoff { initial: Duration, max: Duration },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::Backoff {
            initial: Duration::from_millis(150),
            max: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next session, without jitter.
    ///
    /// `consecutive_failures` counts sessions in a row that failed to open or closed
    /// before becoming stable. A stable session resets it to zero.
    pub fn base_delay(&self, consecutive_failures: u32) -> Duration {
        match *self {
            Self::Immediate => Duration::ZERO,
            Self::Backoff { initial, max } => {
                if consecutive_failures == 0 {
                    return Duration::ZERO;
                }
                let exponent = (consecutive_failures - 1).min(31);
                initial.saturating_mul(1u32 << exponent).min(max)
            }
        }
    }

    pub fn delay(&self, consecutive_failures: u32) -> Duration {
        let base = self.base_delay(consecutive_failures);
        if base.is_zero() {
            return base;
        }
        let jitter = rand::random::<u64>() % MAX_JITTER_MS;
        base + Duration::from_millis(jitter)
    }
}

/// Counters of the stream ingestor, readable while it runs.
#[derive(Debug, Default)]
pub struct StreamStats {
    sessions: AtomicU64,
    reconnects: AtomicU64,
    documents: AtomicU64,
}

impl StreamStats {
    pub fn sessions(&self) -> u64 {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn documents(&self) -> u64 {
        self.documents.load(Ordering::SeqCst)
    }

    pub(crate) fn session_opened(&self) -> u64 {
        self.sessions.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn reconnecting(&self) {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn document_processed(&self) {
        self.documents.fetch_add(1, Ordering::SeqCst);
    }
}
