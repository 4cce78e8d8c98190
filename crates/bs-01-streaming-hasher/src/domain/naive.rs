//! # Naive Hasher
//!
//! Keeps every leaf and computes everything on demand on the calling thread.
//! Used as the reference for the concurrent hasher and by synchronous
//! verification sessions.

use super::digest::{combine_pairs, EMPTY_HASHES, MAX_LEAVES};
use super::errors::HasherError;
use super::status::{root_height_for, TreeStatus};
use crate::ports::inbound::{read_leaf, RootHashFuture, StreamingTreeHasher};
use shared_types::Hash48;

#[derive(Debug, Default)]
pub struct NaiveStreamingTreeHasher {
    leaves: Vec<Hash48>,
    root_requested: bool,
}

impl NaiveStreamingTreeHasher {
    pub fn new() -> Self {
        Self::default()
    }

    fn compute_root(&self) -> Hash48 {
        if self.leaves.is_empty() {
            return EMPTY_HASHES[0];
        }
        let mut level = self.leaves.clone();
        let mut height = 0;
        while level.len() > 1 {
            level = combine_pairs(height, &level);
            height += 1;
        }
        level[0]
    }

    fn compute_status(&self) -> TreeStatus {
        let num_leaves = self.leaves.len() as u64;
        if num_leaves == 0 {
            return TreeStatus::EMPTY;
        }
        let stop = root_height_for(num_leaves + 1);
        let mut rightmost = Vec::with_capacity(stop);
        let mut level = self.leaves.clone();
        for height in 0..stop {
            let held = if level.len() % 2 == 1 { level.pop() } else { None };
            rightmost.push(held);
            // An unpaired hash stays at its height.
            level = combine_pairs(height, &level);
        }
        TreeStatus::new(num_leaves, rightmost)
    }
}

impl StreamingTreeHasher for NaiveStreamingTreeHasher {
    fn add_leaf(&mut self, leaf: &[u8]) -> Result<(), HasherError> {
        if self.root_requested {
            return Err(HasherError::IllegalState("cannot add leaves after requesting the root hash"));
        }
        let hash = read_leaf(leaf)?;
        if self.leaves.len() as u64 >= MAX_LEAVES {
            return Err(HasherError::CapacityExceeded { max: MAX_LEAVES });
        }
        self.leaves.push(hash);
        Ok(())
    }

    fn root_hash(&mut self) -> Result<RootHashFuture, HasherError> {
        if self.root_requested {
            return Err(HasherError::IllegalState("root hash already requested"));
        }
        self.root_requested = true;
        Ok(RootHashFuture::ready(self.compute_root()))
    }

    fn status(&mut self) -> Result<TreeStatus, HasherError> {
        if self.root_requested {
            return Err(HasherError::IllegalState("cannot take status after requesting the root hash"));
        }
        Ok(self.compute_status())
    }

    fn num_leaves(&self) -> u64 {
        self.leaves.len() as u64
    }
}
