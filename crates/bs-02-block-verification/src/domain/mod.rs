//! # Domain Layer
//!
//! Pure verification logic, no I/O.

pub mod block_hash;
pub mod classify;
pub mod entities;
pub mod errors;
