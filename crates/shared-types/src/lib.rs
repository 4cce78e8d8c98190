//! # Shared Types Crate
//!
//! Entities that flow between the block stream producer, the verification
//! subsystem and the notifier.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: item kinds, header and proof payloads are
//!   defined once, here.
//! - **Canonical Encoding**: every item is encoded with `bincode`; the leaf
//!   hash of an item is computed over exactly these bytes.
//! - **Opaque Payloads**: a `BlockItem` carries its payload unparsed. Only the
//!   header and proof are ever decoded by the node.

pub mod entities;
pub mod errors;
pub mod stream;

pub use entities::*;
pub use errors::*;
pub use stream::*;
