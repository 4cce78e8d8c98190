//! # Tree Status
//!
//! The right frontier of a partially built tree. Together with one more leaf
//! it is enough to compute the root of the tree containing that leaf.

use super::digest::{combine, EMPTY_HASHES};
use super::errors::HasherError;
use shared_types::Hash48;

/// Snapshot of a hasher taken without closing it.
///
/// `rightmost_hashes[h]` holds the unpaired hash waiting at height `h`, or
/// `None` when every hash at that height already has a sibling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStatus {
    num_leaves: u64,
    rightmost_hashes: Vec<Option<Hash48>>,
}

impl TreeStatus {
    /// Status of a tree with no leaves.
    pub const EMPTY: TreeStatus = TreeStatus {
        num_leaves: 0,
        rightmost_hashes: Vec::new(),
    };

    pub fn new(num_leaves: u64, rightmost_hashes: Vec<Option<Hash48>>) -> Self {
        Self {
            num_leaves,
            rightmost_hashes,
        }
    }

    pub fn num_leaves(&self) -> u64 {
        self.num_leaves
    }

    pub fn rightmost_hashes(&self) -> &[Option<Hash48>] {
        &self.rightmost_hashes
    }
}

/// Height of the root of a tree holding `num_leaves` leaves.
///
/// That is `log2` of the smallest power of two `>= num_leaves`, and `0` for
/// an empty tree.
pub fn root_height_for(num_leaves: u64) -> usize {
    if num_leaves == 0 {
        return 0;
    }
    num_leaves.next_power_of_two().trailing_zeros() as usize
}

/// Root of the tree described by `status` after appending `last_leaf`.
///
/// Walking up from the new leaf, a stored frontier hash is its left sibling;
/// a missing one means the new subtree is a left child padded with the empty
/// hash of that height.
pub fn root_hash_from(status: &TreeStatus, last_leaf: &Hash48) -> Result<Hash48, HasherError> {
    let height = root_height_for(status.num_leaves + 1);
    if status.rightmost_hashes.len() < height {
        return Err(HasherError::InvalidArgument(format!(
            "status of {} leaves carries {} frontier hashes, need {}",
            status.num_leaves,
            status.rightmost_hashes.len(),
            height
        )));
    }

    let mut hash = *last_leaf;
    for (level, rightmost) in status.rightmost_hashes[..height].iter().enumerate() {
        hash = match rightmost {
            Some(left) => combine(left, &hash),
            None => combine(&hash, &EMPTY_HASHES[level]),
        };
    }
    Ok(hash)
}
