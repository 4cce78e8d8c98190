//! # Outbound Ports (Driven Ports / SPI)
//!
//! Capabilities a session consumes from the rest of the node.

use shared_types::{Hash48, PublishStreamResponseCode};

/// Checks a block proof signature against the composed block hash.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, block_hash: &Hash48, signature: &[u8]) -> bool;
}

/// Sink for the terminal outcome of each block.
pub trait BlockNotifier: Send + Sync {
    /// The block was verified.
    fn send_ack(&self, block_number: u64, block_hash: Hash48, already_exists: bool);

    /// The producer stream for `block_number` ends with `code`.
    fn send_end_of_stream(&self, block_number: u64, code: PublishStreamResponseCode);
}

/// Fire-and-forget verification counters.
///
/// Implementations must never fail or block verification.
pub trait VerificationMetrics: Send + Sync {
    fn block_received(&self);

    fn block_verified(&self);

    fn block_failed(&self, code: PublishStreamResponseCode);
}
