//! # Synthetic Producer
//!
//! Emits a chain of well-formed blocks the way a consensus node streams
//! them: header, rounds of events with their transactions, results and
//! state changes, then the block proof.
//!
//! Proofs are "signed" with the block hash itself, which is what the
//! hash-echo signature verifier accepts.

use bs_01_streaming_hasher::{sha384, Hash48};
use bs_02_block_verification::{compute_block_hash, VerificationError};
use shared_types::{BlockHeader, BlockItem, BlockItemKind, BlockProof, CodecError};
use thiserror::Error;

/// Events per consensus round.
const EVENTS_PER_ROUND: usize = 8;

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("Failed to encode block item: {0}")]
    Codec(#[from] CodecError),

    #[error("Failed to hash block: {0}")]
    Hashing(#[from] VerificationError),
}

/// One produced block, split into batches.
#[derive(Debug, Clone)]
pub struct ProducedBlock {
    pub number: u64,
    pub block_hash: Hash48,
    pub batches: Vec<Vec<BlockItem>>,
}

impl ProducedBlock {
    pub fn item_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }
}

pub struct SyntheticProducer {
    next_number: u64,
    previous_root: Hash48,
    events_per_block: usize,
    items_per_batch: usize,
}

impl SyntheticProducer {
    /// Producer starting at block 0 on top of an all-zero root.
    pub fn new(events_per_block: usize, items_per_batch: usize) -> Self {
        Self {
            next_number: 0,
            previous_root: [0u8; 48],
            events_per_block,
            items_per_batch: items_per_batch.max(1),
        }
    }

    /// Build the next block of the chain.
    pub fn next_block(&mut self) -> Result<ProducedBlock, ProducerError> {
        let number = self.next_number;
        let header = BlockHeader {
            number,
            previous_block_hash: self.previous_root,
            block_timestamp: 1_700_000_000 + number * 2,
        };

        let mut items = vec![BlockItem::from_header(&header)?];
        for event in 0..self.events_per_block {
            if event % EVENTS_PER_ROUND == 0 {
                items.push(BlockItem::new(BlockItemKind::RoundHeader, payload(number, event, b"round")));
            }
            items.push(BlockItem::new(BlockItemKind::EventHeader, payload(number, event, b"event")));
            items.push(BlockItem::new(BlockItemKind::EventTransaction, payload(number, event, b"tx")));
            items.push(BlockItem::new(BlockItemKind::TransactionResult, payload(number, event, b"result")));
            if event % 3 == 0 {
                items.push(BlockItem::new(BlockItemKind::TransactionOutput, payload(number, event, b"output")));
            }
        }
        items.push(BlockItem::new(BlockItemKind::StateChanges, payload(number, 0, b"state")));

        let start_of_block_state_root_hash = sha384(&payload(number, 0, b"state-root"));
        let block_hash = compute_block_hash(&items, &self.previous_root, &start_of_block_state_root_hash)?;
        items.push(BlockItem::from_proof(&BlockProof {
            block: number,
            previous_block_root_hash: self.previous_root,
            start_of_block_state_root_hash,
            block_signature: block_hash.to_vec(),
        })?);

        self.next_number += 1;
        self.previous_root = block_hash;

        Ok(ProducedBlock {
            number,
            block_hash,
            batches: items.chunks(self.items_per_batch).map(<[BlockItem]>::to_vec).collect(),
        })
    }
}

fn payload(number: u64, index: usize, tag: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(tag.len() + 16);
    bytes.extend_from_slice(tag);
    bytes.extend_from_slice(&number.to_be_bytes());
    bytes.extend_from_slice(&(index as u64).to_be_bytes());
    bytes
}
