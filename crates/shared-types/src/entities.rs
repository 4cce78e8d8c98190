//! # Block Stream Entities
//!
//! The unit of streaming is the [`BlockItem`]. A block is an ordered run of
//! items that starts with a `BlockHeader` item and ends with a `BlockProof`
//! item. Everything in between is opaque to the node except for its kind,
//! which decides the Merkle tree the item is hashed into.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::errors::CodecError;

/// Length in bytes of every hash on the block stream (SHA-384).
pub const HASH_LENGTH: usize = 48;

/// A 48-byte SHA-384 digest.
pub type Hash48 = [u8; HASH_LENGTH];

/// Kind of a streamed block item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockItemKind {
    /// First item of every block.
    BlockHeader,
    /// Consensus event header.
    EventHeader,
    /// Consensus round header.
    RoundHeader,
    /// Transaction carried inside a consensus event.
    EventTransaction,
    /// Result of a transaction.
    TransactionResult,
    /// Additional output of a transaction.
    TransactionOutput,
    /// State changes applied by the block.
    StateChanges,
    /// Hash standing in for a filtered-out item.
    FilteredItemHash,
    /// Legacy record file carried for historical blocks.
    RecordFile,
    /// Last item of every block.
    BlockProof,
}

/// One item of the block stream with its payload left unparsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockItem {
    /// What the payload represents.
    pub kind: BlockItemKind,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl BlockItem {
    /// Create an item from its kind and raw payload.
    pub fn new(kind: BlockItemKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Wrap an encoded header.
    pub fn from_header(header: &BlockHeader) -> Result<Self, CodecError> {
        Ok(Self::new(
            BlockItemKind::BlockHeader,
            encode("BlockHeader", header)?,
        ))
    }

    /// Wrap an encoded proof.
    pub fn from_proof(proof: &BlockProof) -> Result<Self, CodecError> {
        Ok(Self::new(BlockItemKind::BlockProof, encode("BlockProof", proof)?))
    }

    pub fn is_block_header(&self) -> bool {
        self.kind == BlockItemKind::BlockHeader
    }

    pub fn is_block_proof(&self) -> bool {
        self.kind == BlockItemKind::BlockProof
    }

    /// Canonical bytes of the whole item, used as input to its leaf hash.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        encode("BlockItem", self)
    }

    /// Decode the header carried by a `BlockHeader` item.
    pub fn decode_header(&self) -> Result<BlockHeader, CodecError> {
        self.expect_kind(BlockItemKind::BlockHeader)?;
        decode("BlockHeader", &self.payload)
    }

    /// Decode the proof carried by a `BlockProof` item.
    pub fn decode_proof(&self) -> Result<BlockProof, CodecError> {
        self.expect_kind(BlockItemKind::BlockProof)?;
        decode("BlockProof", &self.payload)
    }

    fn expect_kind(&self, expected: BlockItemKind) -> Result<(), CodecError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(CodecError::UnexpectedKind {
                expected,
                actual: self.kind,
            })
        }
    }
}

/// Header opening a block.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block number.
    pub number: u64,
    /// Root hash of the previous block.
    #[serde_as(as = "Bytes")]
    pub previous_block_hash: Hash48,
    /// Consensus timestamp of the block, in seconds.
    pub block_timestamp: u64,
}

/// Proof closing a block.
///
/// The block hash is composed from the two hashes carried here and the roots
/// of the input and output trees; `block_signature` must sign that hash.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockProof {
    /// Number of the block this proof closes.
    pub block: u64,
    /// Root hash of the previous block.
    #[serde_as(as = "Bytes")]
    pub previous_block_root_hash: Hash48,
    /// State root at the start of the block.
    #[serde_as(as = "Bytes")]
    pub start_of_block_state_root_hash: Hash48,
    /// Signature over the composed block hash.
    pub block_signature: Vec<u8>,
}

/// Short hex rendering of a hash for log lines.
pub fn short_hex(bytes: &[u8]) -> String {
    let end = bytes.len().min(8);
    hex::encode(&bytes[..end])
}

fn encode<T: Serialize>(entity: &'static str, value: &T) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(value).map_err(|e| CodecError::Encode {
        entity,
        reason: e.to_string(),
    })
}

fn decode<T: for<'de> Deserialize<'de>>(entity: &'static str, bytes: &[u8]) -> Result<T, CodecError> {
    bincode::deserialize(bytes).map_err(|e| CodecError::Decode {
        entity,
        reason: e.to_string(),
    })
}
