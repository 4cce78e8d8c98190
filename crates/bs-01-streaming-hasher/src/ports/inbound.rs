//! # Inbound Ports
//!
//! The contract shared by every streaming tree hasher.

use crate::domain::errors::HasherError;
use crate::domain::status::TreeStatus;
use futures::channel::oneshot;
use futures::FutureExt;
use shared_types::{Hash48, HASH_LENGTH};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Incremental Merkle tree hasher over 48-byte leaves.
///
/// ## Contract
///
/// - Leaves are appended in order; the root depends on that order only.
/// - `root_hash` closes the tree. Afterwards `add_leaf`, `status` and a second
///   `root_hash` fail with `IllegalState`.
/// - `status` never closes the tree, but may block until in-flight combination
///   work below the frontier has finished.
pub trait StreamingTreeHasher: Send {
    /// Append a leaf. Only the first 48 bytes of `leaf` are read.
    fn add_leaf(&mut self, leaf: &[u8]) -> Result<(), HasherError>;

    /// Close the tree and obtain its root.
    fn root_hash(&mut self) -> Result<RootHashFuture, HasherError>;

    /// Right frontier of the tree as of now.
    fn status(&mut self) -> Result<TreeStatus, HasherError>;

    fn num_leaves(&self) -> u64;
}

/// Root hash that may still be under computation.
///
/// Await it from async code, or `wait()` for it from a plain thread. Never
/// `wait()` on a thread of the worker pool doing the combining.
#[derive(Debug)]
pub struct RootHashFuture {
    receiver: oneshot::Receiver<Hash48>,
}

impl RootHashFuture {
    pub(crate) fn new(receiver: oneshot::Receiver<Hash48>) -> Self {
        Self { receiver }
    }

    /// A future that is already complete.
    pub fn ready(root: Hash48) -> Self {
        let (sender, receiver) = oneshot::channel();
        // The receiver is alive, so the send cannot fail.
        let _ = sender.send(root);
        Self { receiver }
    }

    /// Block the current thread until the root is available.
    pub fn wait(self) -> Result<Hash48, HasherError> {
        futures::executor::block_on(self)
    }
}

impl Future for RootHashFuture {
    type Output = Result<Hash48, HasherError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver
            .poll_unpin(cx)
            .map(|result| result.map_err(|_| HasherError::Cancelled))
    }
}

/// Copy the leading 48 bytes of a leaf.
pub(crate) fn read_leaf(leaf: &[u8]) -> Result<Hash48, HasherError> {
    if leaf.len() < HASH_LENGTH {
        return Err(HasherError::InvalidArgument(format!(
            "leaf must carry at least {} bytes, got {}",
            HASH_LENGTH,
            leaf.len()
        )));
    }
    let mut hash = [0u8; HASH_LENGTH];
    hash.copy_from_slice(&leaf[..HASH_LENGTH]);
    Ok(hash)
}
