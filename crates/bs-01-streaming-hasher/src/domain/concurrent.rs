//! # Concurrent Hasher
//!
//! Streams leaves into per-height buffers. Whenever a buffer reaches the batch
//! size it is combined pairwise and the results move one height up. Small
//! batches are combined inline; larger ones run on the worker pool.
//!
//! ## Ordering
//!
//! Every batch taken from a height gets a ticket. Results are forwarded to
//! the next height strictly in ticket order, so a batch finishing early waits
//! in a reorder buffer until all earlier batches of its height have landed.
//! Because only even-length runs are ever combined before finalization,
//! pairing never drifts from the pairing of the perfect tree.
//!
//! ## Finalization
//!
//! Requesting the root flushes heights bottom-up. A height is flushed once
//! everything below it has been delivered; if it still has batches in flight
//! the cursor parks there and the last finishing worker moves it on. The root
//! is delivered through a oneshot channel, so nothing blocks a pool thread.

use super::digest::{combine_pairs, EMPTY_HASHES, MAX_DEPTH, MAX_LEAVES, MIN_TO_SCHEDULE};
use super::errors::HasherError;
use super::status::{root_height_for, TreeStatus};
use crate::adapters::pool::WorkerPool;
use crate::ports::inbound::{read_leaf, RootHashFuture, StreamingTreeHasher};
use futures::channel::oneshot;
use parking_lot::{Condvar, Mutex};
use shared_types::Hash48;
use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;
use tracing::{debug, trace};

/// Batch size used when none is configured.
pub const DEFAULT_HASH_COMBINE_BATCH_SIZE: usize = 8;

pub struct ConcurrentStreamingTreeHasher {
    shared: Arc<Shared>,
    num_leaves: u64,
    root_requested: bool,
}

struct Shared {
    pool: WorkerPool,
    batch_size: usize,
    tree: Mutex<CombinerTree>,
    /// Signalled whenever a pooled batch completes.
    batch_done: Condvar,
}

struct CombinerTree {
    levels: Vec<Level>,
    finalization: Option<Finalization>,
}

#[derive(Default)]
struct Level {
    pending: Vec<Hash48>,
    next_ticket: u64,
    next_to_forward: u64,
    finished: BTreeMap<u64, Vec<Hash48>>,
}

impl Level {
    fn in_flight(&self) -> bool {
        self.next_to_forward < self.next_ticket
    }

    fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }
}

struct Finalization {
    root_height: usize,
    cursor: usize,
    sender: Option<oneshot::Sender<Hash48>>,
}

impl ConcurrentStreamingTreeHasher {
    /// Hasher on `pool` with the default batch size.
    pub fn new(pool: WorkerPool) -> Self {
        Self::build(pool, DEFAULT_HASH_COMBINE_BATCH_SIZE)
    }

    /// Hasher on `pool` combining `batch_size` hashes per job.
    ///
    /// `batch_size` must be positive and even.
    pub fn with_batch_size(pool: WorkerPool, batch_size: usize) -> Result<Self, HasherError> {
        if batch_size == 0 || batch_size % 2 != 0 {
            return Err(HasherError::InvalidArgument(format!(
                "hash combine batch size must be positive and even, got {batch_size}"
            )));
        }
        Ok(Self::build(pool, batch_size))
    }

    fn build(pool: WorkerPool, batch_size: usize) -> Self {
        let levels = (0..MAX_DEPTH).map(|_| Level::default()).collect();
        Self {
            shared: Arc::new(Shared {
                pool,
                batch_size,
                tree: Mutex::new(CombinerTree {
                    levels,
                    finalization: None,
                }),
                batch_done: Condvar::new(),
            }),
            num_leaves: 0,
            root_requested: false,
        }
    }
}

impl StreamingTreeHasher for ConcurrentStreamingTreeHasher {
    fn add_leaf(&mut self, leaf: &[u8]) -> Result<(), HasherError> {
        if self.root_requested {
            return Err(HasherError::IllegalState("cannot add leaves after requesting the root hash"));
        }
        let hash = read_leaf(leaf)?;
        if self.num_leaves >= MAX_LEAVES {
            return Err(HasherError::CapacityExceeded { max: MAX_LEAVES });
        }
        self.num_leaves += 1;
        let mut tree = self.shared.tree.lock();
        self.shared.push(&mut tree, 0, hash);
        Ok(())
    }

    fn root_hash(&mut self) -> Result<RootHashFuture, HasherError> {
        if self.root_requested {
            return Err(HasherError::IllegalState("root hash already requested"));
        }
        self.root_requested = true;

        let root_height = root_height_for(self.num_leaves);
        debug!(leaves = self.num_leaves, root_height, "Finalizing concurrent tree");

        let (sender, receiver) = oneshot::channel();
        let mut tree = self.shared.tree.lock();
        tree.finalization = Some(Finalization {
            root_height,
            cursor: 0,
            sender: Some(sender),
        });
        self.shared.advance_finalization(&mut tree);
        Ok(RootHashFuture::new(receiver))
    }

    /// Blocks until every height below the frontier has settled.
    fn status(&mut self) -> Result<TreeStatus, HasherError> {
        if self.root_requested {
            return Err(HasherError::IllegalState("cannot take status after requesting the root hash"));
        }
        if self.num_leaves == 0 {
            return Ok(TreeStatus::EMPTY);
        }

        let stop = root_height_for(self.num_leaves + 1);
        let mut rightmost = Vec::with_capacity(stop);
        let mut tree = self.shared.tree.lock();
        for height in 0..stop {
            while tree.levels[height].in_flight() {
                self.shared.batch_done.wait(&mut tree);
            }
            let level = &mut tree.levels[height];
            let held = if level.pending.len() % 2 == 1 {
                level.pending.pop()
            } else {
                None
            };
            let batch = mem::take(&mut level.pending);
            if !batch.is_empty() {
                let ticket = level.take_ticket();
                let combined = combine_pairs(height, &batch);
                self.shared.forward(&mut tree, height, ticket, combined);
            }
            if let Some(hash) = held {
                tree.levels[height].pending.push(hash);
            }
            rightmost.push(held);
        }
        Ok(TreeStatus::new(self.num_leaves, rightmost))
    }

    fn num_leaves(&self) -> u64 {
        self.num_leaves
    }
}

impl Shared {
    fn push(self: &Arc<Self>, tree: &mut CombinerTree, height: usize, hash: Hash48) {
        let level = &mut tree.levels[height];
        level.pending.push(hash);
        if level.pending.len() >= self.batch_size {
            self.schedule(tree, height);
        }
    }

    /// Take everything pending at `height` as one batch.
    fn schedule(self: &Arc<Self>, tree: &mut CombinerTree, height: usize) {
        let level = &mut tree.levels[height];
        if level.pending.is_empty() {
            return;
        }
        let batch = mem::take(&mut level.pending);
        let ticket = level.take_ticket();

        if batch.len() < MIN_TO_SCHEDULE {
            let combined = combine_pairs(height, &batch);
            self.forward(tree, height, ticket, combined);
            return;
        }

        trace!(height, ticket, size = batch.len(), "Submitting combine batch");
        let shared = Arc::clone(self);
        self.pool.spawn(move || {
            let combined = combine_pairs(height, &batch);
            let mut tree = shared.tree.lock();
            shared.forward(&mut tree, height, ticket, combined);
            shared.advance_finalization(&mut tree);
            drop(tree);
            shared.batch_done.notify_all();
        });
    }

    /// Record the result of batch `ticket` and move every result that is now
    /// in order up to `height + 1`.
    fn forward(self: &Arc<Self>, tree: &mut CombinerTree, height: usize, ticket: u64, combined: Vec<Hash48>) {
        tree.levels[height].finished.insert(ticket, combined);
        loop {
            let level = &mut tree.levels[height];
            let next = level.next_to_forward;
            let Some(results) = level.finished.remove(&next) else {
                break;
            };
            level.next_to_forward += 1;
            for hash in results {
                self.push(tree, height + 1, hash);
            }
        }
    }

    /// Move the finalization cursor as far up as completed work allows.
    fn advance_finalization(self: &Arc<Self>, tree: &mut CombinerTree) {
        loop {
            let (height, root_height) = match &tree.finalization {
                Some(fin) if fin.sender.is_some() => (fin.cursor, fin.root_height),
                _ => return,
            };

            if height == root_height {
                let root = tree.levels[height]
                    .pending
                    .first()
                    .copied()
                    .unwrap_or(EMPTY_HASHES[0]);
                if let Some(sender) = tree.finalization.as_mut().and_then(|fin| fin.sender.take()) {
                    debug!(root_height, "Concurrent tree root ready");
                    // A dropped receiver just means nobody wants the root anymore.
                    let _ = sender.send(root);
                }
                return;
            }

            self.schedule(tree, height);
            if tree.levels[height].in_flight() {
                return;
            }
            if let Some(fin) = tree.finalization.as_mut() {
                fin.cursor += 1;
            }
        }
    }
}
