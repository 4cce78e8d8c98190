//! # Adapters Layer
//!
//! Concrete implementations of the outbound ports.

pub mod metrics;
pub mod notifier;
pub mod signature;
