//! # Block Verification Subsystem (BS-02)
//!
//! Verifies every block streamed by a producer before it is acknowledged.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): item classification, leaf and block hash
//!   composition, session states and results, errors
//! - **Ports Layer** (`ports/`): the inbound verification API and the
//!   outbound signature, notification and metrics ports
//! - **Adapters Layer** (`adapters/`): signature verifiers, the broadcast
//!   notifier and the metrics sinks
//! - **Session / Factory / Service**: wire the hashers of BS-01 to the ports
//!
//! ## Verification Flow
//!
//! ```text
//! header item ──→ service ──→ factory ──→ new session (RUNNING)
//!                                            │
//! block items ──→ classify ──→ input tree  (events, round headers)
//!                         └──→ output tree (header, results, outputs, state)
//!                                            │
//! block proof ──→ roots ──→ compose block hash ──→ verify signature
//!                                            │
//!                     COMPLETED + ack  ◄─────┴─────►  FAILED + end-of-stream
//! ```
//!
//! Every session emits exactly one terminal outcome.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod factory;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod session;

// Re-export public API
pub use adapters::metrics::{
    AtomicVerificationMetrics, PrometheusVerificationMetrics, VerificationMetricsSnapshot,
};
pub use adapters::notifier::BroadcastNotifier;
pub use adapters::signature::{Ed25519SignatureVerifier, HashEchoSignatureVerifier};
pub use config::{
    ConfigError, HasherStrategy, ServiceType, SessionType, VerificationConfig, DEFAULT_SESSION_QUEUE_CAPACITY,
};
pub use domain::block_hash::{compose_block_hash, compute_block_hash, leaf_hash};
pub use domain::classify::{classify, TreeSide};
pub use domain::entities::{SessionState, VerificationOutcome, VerificationResult};
pub use domain::errors::VerificationError;
pub use factory::{BlockVerificationSessionFactory, SessionExecutors};
pub use ports::inbound::BlockVerificationApi;
pub use ports::outbound::{BlockNotifier, SignatureVerifier, VerificationMetrics};
pub use service::{build_verification_service, BlockVerificationService, NoOpBlockVerificationService};
pub use session::{BlockVerificationSession, SessionCollaborators};
