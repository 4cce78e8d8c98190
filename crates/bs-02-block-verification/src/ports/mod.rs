//! # Ports Layer
//!
//! - `inbound`: what the node calls (driving port)
//! - `outbound`: what verification needs from the node (driven ports)

pub mod inbound;
pub mod outbound;
