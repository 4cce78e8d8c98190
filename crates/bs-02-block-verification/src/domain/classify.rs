//! # Item Classification
//!
//! Decides which Merkle tree an item is hashed into.

use shared_types::BlockItemKind;

/// One of the two trees of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSide {
    /// Consensus input: events and rounds.
    Input,
    /// Execution output: header, results, outputs, state changes.
    Output,
}

/// Tree an item of `kind` belongs to, or `None` if it is not hashed.
///
/// The block proof, filtered-item hashes and record files stay out of both
/// trees.
pub fn classify(kind: BlockItemKind) -> Option<TreeSide> {
    match kind {
        BlockItemKind::EventHeader | BlockItemKind::EventTransaction | BlockItemKind::RoundHeader => {
            Some(TreeSide::Input)
        }
        BlockItemKind::TransactionOutput
        | BlockItemKind::StateChanges
        | BlockItemKind::TransactionResult
        | BlockItemKind::BlockHeader => Some(TreeSide::Output),
        BlockItemKind::FilteredItemHash | BlockItemKind::RecordFile | BlockItemKind::BlockProof => None,
    }
}
