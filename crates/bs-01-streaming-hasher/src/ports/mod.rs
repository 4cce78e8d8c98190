//! # Ports Layer
//!
//! The hasher API used by verification sessions.

pub mod inbound;
