//! # SHA-384 Digests
//!
//! Leaf and inner-node hashing plus the table of canonical empty-subtree
//! hashes used to pad the right edge of a tree.

use lazy_static::lazy_static;
use sha2::{Digest, Sha384};
use shared_types::{Hash48, HASH_LENGTH};

/// Number of tree heights a hasher can address (heights `0..MAX_DEPTH`).
pub const MAX_DEPTH: usize = 24;

/// Largest number of leaves whose root still fits below `MAX_DEPTH`.
pub const MAX_LEAVES: u64 = 1 << (MAX_DEPTH - 1);

/// Batches smaller than this are combined inline instead of on the pool.
pub const MIN_TO_SCHEDULE: usize = 16;

lazy_static! {
    /// `EMPTY_HASHES[h]` is the root of a perfect subtree of height `h`
    /// whose leaves are all `SHA384("")`.
    pub static ref EMPTY_HASHES: [Hash48; MAX_DEPTH] = {
        let mut table = [[0u8; HASH_LENGTH]; MAX_DEPTH];
        table[0] = sha384(&[]);
        for height in 1..MAX_DEPTH {
            table[height] = combine(&table[height - 1], &table[height - 1]);
        }
        table
    };
}

/// One-shot SHA-384.
pub fn sha384(data: &[u8]) -> Hash48 {
    finish(Sha384::digest(data).as_slice())
}

/// Parent of two sibling hashes: `SHA384(left || right)`.
pub fn combine(left: &Hash48, right: &Hash48) -> Hash48 {
    let mut hasher = Sha384::new();
    hasher.update(left);
    hasher.update(right);
    finish(hasher.finalize().as_slice())
}

/// Combine adjacent pairs of a run of hashes sitting at `height`.
///
/// A trailing odd hash is paired with `EMPTY_HASHES[height]`.
pub fn combine_pairs(height: usize, hashes: &[Hash48]) -> Vec<Hash48> {
    let mut hasher = Sha384::new();
    hashes
        .chunks(2)
        .map(|pair| {
            let right = pair.get(1).unwrap_or(&EMPTY_HASHES[height]);
            hasher.update(pair[0]);
            hasher.update(right);
            finish(hasher.finalize_reset().as_slice())
        })
        .collect()
}

fn finish(digest: &[u8]) -> Hash48 {
    let mut out = [0u8; HASH_LENGTH];
    out.copy_from_slice(digest);
    out
}
