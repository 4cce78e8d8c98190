//! # Publish Stream Responses
//!
//! What the node sends back to block producers: an acknowledgement once a
//! block is verified, or an end-of-stream carrying a response code.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::entities::Hash48;

/// Status codes carried by an end-of-stream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublishStreamResponseCode {
    StreamItemsUnknown,
    StreamItemsSuccess,
    StreamItemsTimeout,
    StreamItemsOutOfOrder,
    /// The block failed verification.
    StreamItemsBadStateProof,
    StreamItemsBehind,
    /// The node hit an internal failure while processing the block.
    StreamItemsInternalError,
    StreamItemsPersistenceFailed,
}

/// Acknowledgement of one verified block.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAcknowledgement {
    pub block_number: u64,
    #[serde_as(as = "Bytes")]
    pub block_root_hash: Hash48,
    /// The node already held this block.
    pub block_already_exists: bool,
}

/// Termination of a producer stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndOfStream {
    /// Last block number the node knows about.
    pub block_number: u64,
    pub status: PublishStreamResponseCode,
}

/// One response on the publish stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishStreamResponse {
    Acknowledgement(BlockAcknowledgement),
    EndOfStream(EndOfStream),
}

impl PublishStreamResponse {
    pub fn ack(block_number: u64, block_root_hash: Hash48, block_already_exists: bool) -> Self {
        Self::Acknowledgement(BlockAcknowledgement {
            block_number,
            block_root_hash,
            block_already_exists,
        })
    }

    pub fn end_of_stream(block_number: u64, status: PublishStreamResponseCode) -> Self {
        Self::EndOfStream(EndOfStream {
            block_number,
            status,
        })
    }

    /// Block number the response refers to.
    pub fn block_number(&self) -> u64 {
        match self {
            Self::Acknowledgement(ack) => ack.block_number,
            Self::EndOfStream(eos) => eos.block_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_number_accessor() {
        let ack = PublishStreamResponse::ack(5, [0u8; 48], false);
        let eos = PublishStreamResponse::end_of_stream(
            6,
            PublishStreamResponseCode::StreamItemsBadStateProof,
        );
        assert_eq!(ack.block_number(), 5);
        assert_eq!(eos.block_number(), 6);
    }
}
