//! # Domain Layer
//!
//! Pure hashing logic. The only side effect is the submission of combination
//! batches to the worker pool by the concurrent hasher.

pub mod concurrent;
pub mod digest;
pub mod errors;
pub mod naive;
pub mod status;
