//! # Hasher Errors

use thiserror::Error;

/// Errors raised by the streaming tree hashers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HasherError {
    /// An argument violates the hasher contract (short leaf, odd batch size).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The call is not allowed in the current state of the tree.
    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    /// One more leaf would push the root above the maximum tree depth.
    #[error("Tree capacity exceeded: at most {max} leaves")]
    CapacityExceeded { max: u64 },

    /// The root hash sender was dropped before completing.
    #[error("Root hash computation was cancelled")]
    Cancelled,

    /// A dedicated worker pool could not be built.
    #[error("Worker pool initialization failed: {0}")]
    PoolInit(String),
}
