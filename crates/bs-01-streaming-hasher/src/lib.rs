//! # Streaming Tree Hasher (BS-01)
//!
//! Computes the SHA-384 root of a perfect binary Merkle tree while leaves are
//! still streaming in, and exposes the right frontier of the tree so a root
//! can be derived from one more leaf without replaying the whole tree.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): digests, empty-subtree table, tree status,
//!   the naive and the concurrent hashers
//! - **Ports Layer** (`ports/`): the `StreamingTreeHasher` contract and the
//!   `RootHashFuture` it hands out
//! - **Adapters Layer** (`adapters/`): the rayon worker pool the concurrent
//!   hasher submits batches to
//!
//! ## Tree Shape
//!
//! ```text
//!                 root (height 2)
//!               /                 \
//!        H(a || b)              H(c || E0)
//!        /      \               /        \
//!       a        b             c      E0 = SHA384("")
//! ```
//!
//! Missing leaves on the right are padded with the canonical empty hash of
//! the matching height, so the root only depends on the ordered leaves.
//!
//! ## Concurrency
//!
//! No hasher instance is internally synchronized for callers: one owner adds
//! leaves and requests the root. The concurrent hasher fans combination work
//! out to a shared rayon pool and keeps per-height combination order with an
//! explicit ticket sequencer.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::WorkerPool;
pub use domain::concurrent::{ConcurrentStreamingTreeHasher, DEFAULT_HASH_COMBINE_BATCH_SIZE};
pub use domain::digest::{combine, sha384, EMPTY_HASHES, MAX_DEPTH, MAX_LEAVES, MIN_TO_SCHEDULE};
pub use domain::errors::HasherError;
pub use domain::naive::NaiveStreamingTreeHasher;
pub use domain::status::{root_hash_from, root_height_for, TreeStatus};
pub use ports::inbound::{RootHashFuture, StreamingTreeHasher};
pub use shared_types::{Hash48, HASH_LENGTH};
