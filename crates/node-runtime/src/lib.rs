//! # Block Stream Node Runtime
//!
//! Wires the verification subsystem into a runnable node.
//!
//! ## Modules
//!
//! - `config` - node configuration from the environment
//! - `producer` - synthetic producer emitting signed blocks
//! - `runtime` - service, notifier and metrics wiring
//!
//! ## Flow
//!
//! ```text
//! SyntheticProducer ──batches──→ BlockVerificationService ──→ sessions
//!                                                               │
//!        ack logger ◄──── BroadcastNotifier ◄──── ack / end-of-stream
//! ```

pub mod config;
pub mod producer;
pub mod runtime;

pub use config::{DemoConfig, NodeConfig, NodeConfigError};
pub use producer::SyntheticProducer;
pub use runtime::{DemoReport, NodeRuntime};
