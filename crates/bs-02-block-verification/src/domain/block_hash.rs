//! # Block Hash Composition
//!
//! ```text
//! block hash = H( H(previous_block_root || input_root)
//!              || H(output_root || start_of_block_state_root) )
//! ```

use super::classify::{classify, TreeSide};
use super::errors::VerificationError;
use bs_01_streaming_hasher::{combine, sha384, NaiveStreamingTreeHasher, StreamingTreeHasher};
use shared_types::{BlockItem, BlockProof, Hash48};

/// Leaf hash of an item: SHA-384 over its canonical encoding.
pub fn leaf_hash(item: &BlockItem) -> Result<Hash48, VerificationError> {
    let encoded = item
        .encode()
        .map_err(|e| VerificationError::Unrecoverable(e.to_string()))?;
    Ok(sha384(&encoded))
}

/// Fold the two tree roots with the hashes carried by the proof.
pub fn compose_block_hash(proof: &BlockProof, input_root: &Hash48, output_root: &Hash48) -> Hash48 {
    fold_block_hash(
        &proof.previous_block_root_hash,
        &proof.start_of_block_state_root_hash,
        input_root,
        output_root,
    )
}

fn fold_block_hash(
    previous_block_root_hash: &Hash48,
    start_of_block_state_root_hash: &Hash48,
    input_root: &Hash48,
    output_root: &Hash48,
) -> Hash48 {
    combine(
        &combine(previous_block_root_hash, input_root),
        &combine(output_root, start_of_block_state_root_hash),
    )
}

/// Block hash of a complete run of items, computed on the calling thread.
///
/// This is what a producer signs. Items that are not hashed, including any
/// block proof in `items`, are skipped.
pub fn compute_block_hash(
    items: &[BlockItem],
    previous_block_root_hash: &Hash48,
    start_of_block_state_root_hash: &Hash48,
) -> Result<Hash48, VerificationError> {
    let mut input_tree = NaiveStreamingTreeHasher::new();
    let mut output_tree = NaiveStreamingTreeHasher::new();
    for item in items {
        match classify(item.kind) {
            Some(TreeSide::Input) => input_tree.add_leaf(&leaf_hash(item)?)?,
            Some(TreeSide::Output) => output_tree.add_leaf(&leaf_hash(item)?)?,
            None => {}
        }
    }
    let input_root = input_tree.root_hash()?.wait()?;
    let output_root = output_tree.root_hash()?.wait()?;
    Ok(fold_block_hash(
        previous_block_root_hash,
        start_of_block_state_root_hash,
        &input_root,
        &output_root,
    ))
}
