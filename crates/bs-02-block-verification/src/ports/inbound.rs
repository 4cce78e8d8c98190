//! # Inbound Ports (Driving Ports / API)

use crate::domain::errors::VerificationError;
use shared_types::BlockItem;

/// Entry point for block items arriving from a producer stream.
pub trait BlockVerificationApi: Send + Sync {
    /// Route one batch of items to the session verifying their block.
    ///
    /// A batch starting with a block header opens a new session. Verification
    /// failures never surface here; they end the session and are reported
    /// through the notifier.
    ///
    /// # Errors
    /// * `VerificationError::ParseFailure` - the opening header cannot be decoded
    /// * `VerificationError::InvalidInput` - a session cannot be built from the configuration
    fn on_block_items_received(&self, items: Vec<BlockItem>) -> Result<(), VerificationError>;
}
