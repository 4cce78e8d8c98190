//! Metrics Adapters
//!
//! Implements the `VerificationMetrics` port.

use crate::metrics;
use crate::ports::outbound::VerificationMetrics;
use shared_types::PublishStreamResponseCode;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process counters, readable through `snapshot()`.
#[derive(Debug, Default)]
pub struct AtomicVerificationMetrics {
    received: AtomicU64,
    verified: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of `AtomicVerificationMetrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerificationMetricsSnapshot {
    pub received: u64,
    pub verified: u64,
    pub failed: u64,
}

impl AtomicVerificationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> VerificationMetricsSnapshot {
        VerificationMetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            verified: self.verified.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl VerificationMetrics for AtomicVerificationMetrics {
    fn block_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    fn block_verified(&self) {
        self.verified.fetch_add(1, Ordering::Relaxed);
    }

    fn block_failed(&self, _code: PublishStreamResponseCode) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Forwards to the Prometheus counters of `crate::metrics`.
///
/// Without the `metrics` feature every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusVerificationMetrics;

impl VerificationMetrics for PrometheusVerificationMetrics {
    fn block_received(&self) {
        metrics::record_block_received();
    }

    fn block_verified(&self) {
        metrics::record_block_verified();
    }

    fn block_failed(&self, code: PublishStreamResponseCode) {
        metrics::record_block_failed(&format!("{code:?}"));
    }
}
