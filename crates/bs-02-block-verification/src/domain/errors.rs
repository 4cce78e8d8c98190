//! # Verification Errors

use bs_01_streaming_hasher::HasherError;
use shared_types::PublishStreamResponseCode;
use thiserror::Error;

/// Errors raised while verifying a block.
///
/// `InvalidInput` and `IllegalState` are contract violations reported to the
/// caller that misused the API. The other kinds end a session as failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Malformed argument or configuration.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Call not allowed in the current state.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// A header or proof payload could not be decoded.
    #[error("Failed to parse {item}: {reason}")]
    ParseFailure { item: &'static str, reason: String },

    /// The proof signature does not sign the composed block hash.
    #[error("Signature mismatch for block {block_number} (hash {block_hash})")]
    SignatureMismatch { block_number: u64, block_hash: String },

    /// The proof closes a different block than the session verifies.
    #[error("Proof for block {proof_block} received by session for block {session_block}")]
    BlockNumberMismatch { session_block: u64, proof_block: u64 },

    /// Unexpected failure while processing items.
    #[error("Unrecoverable error: {0}")]
    Unrecoverable(String),
}

impl VerificationError {
    /// Response code sent to the producer when this error ends a session.
    pub fn response_code(&self) -> PublishStreamResponseCode {
        match self {
            Self::ParseFailure { .. }
            | Self::SignatureMismatch { .. }
            | Self::BlockNumberMismatch { .. } => PublishStreamResponseCode::StreamItemsBadStateProof,
            _ => PublishStreamResponseCode::StreamItemsInternalError,
        }
    }
}

impl From<HasherError> for VerificationError {
    fn from(err: HasherError) -> Self {
        match err {
            HasherError::InvalidArgument(reason) => Self::InvalidInput(reason),
            HasherError::IllegalState(reason) => Self::IllegalState(reason.to_string()),
            other => Self::Unrecoverable(other.to_string()),
        }
    }
}
