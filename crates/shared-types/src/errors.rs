//! # Error Types
//!
//! Errors raised while encoding or decoding block stream entities.

use crate::entities::BlockItemKind;
use thiserror::Error;

/// Errors from the canonical item codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Serializing an entity failed.
    #[error("Failed to encode {entity}: {reason}")]
    Encode {
        entity: &'static str,
        reason: String,
    },

    /// The payload bytes are not a valid encoding of the entity.
    #[error("Failed to decode {entity}: {reason}")]
    Decode {
        entity: &'static str,
        reason: String,
    },

    /// The item does not carry the requested payload.
    #[error("Unexpected item kind: expected {expected:?}, got {actual:?}")]
    UnexpectedKind {
        expected: BlockItemKind,
        actual: BlockItemKind,
    },
}
