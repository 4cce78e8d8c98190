//! # Verification Metrics
//!
//! Prometheus counters for block verification.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! bs-02-block-verification = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `verification_blocks_received_total` - Blocks for which a session was opened
//! - `verification_blocks_verified_total` - Blocks whose signature matched
//! - `verification_blocks_failed_total` - Failed blocks, labeled by response code

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

// A counter that fails to register (duplicate name in the default registry)
// stays unset and is skipped.
#[cfg(feature = "metrics")]
lazy_static! {
    /// Blocks for which a session was opened
    pub static ref BLOCKS_RECEIVED: Option<IntCounter> = register_int_counter!(
        "verification_blocks_received_total",
        "Total number of blocks received for verification"
    )
    .ok();

    /// Blocks verified
    pub static ref BLOCKS_VERIFIED: Option<IntCounter> = register_int_counter!(
        "verification_blocks_verified_total",
        "Total number of blocks verified"
    )
    .ok();

    /// Blocks failed, labeled by response code
    pub static ref BLOCKS_FAILED: Option<IntCounterVec> = register_int_counter_vec!(
        "verification_blocks_failed_total",
        "Total number of blocks that failed verification",
        &["code"]
    )
    .ok();
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a block received
#[cfg(feature = "metrics")]
pub fn record_block_received() {
    if let Some(counter) = BLOCKS_RECEIVED.as_ref() {
        counter.inc();
    }
}

/// Record a block verified
#[cfg(feature = "metrics")]
pub fn record_block_verified() {
    if let Some(counter) = BLOCKS_VERIFIED.as_ref() {
        counter.inc();
    }
}

/// Record a block failed with its response code
#[cfg(feature = "metrics")]
pub fn record_block_failed(code: &str) {
    if let Some(counter) = BLOCKS_FAILED.as_ref() {
        counter.with_label_values(&[code]).inc();
    }
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_block_received() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_verified() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_failed(_code: &str) {}
