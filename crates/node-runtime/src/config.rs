//! # Node Configuration
//!
//! Unified configuration for the verification subsystem, logging and the
//! demo producer.

use bs_02_block_verification::adapters::notifier::DEFAULT_NOTIFIER_CAPACITY;
use bs_02_block_verification::{ConfigError, VerificationConfig};
use bs_telemetry::TelemetryConfig;
use thiserror::Error;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Verification configuration.
    pub verification: VerificationConfig,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
    /// Synthetic producer configuration.
    pub demo: DemoConfig,
    /// Responses buffered per notifier subscriber.
    pub notifier_capacity: usize,
    /// Dedicated hashing threads; `None` shares rayon's global pool.
    pub hashing_threads: Option<usize>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            verification: VerificationConfig::default(),
            telemetry: TelemetryConfig::default(),
            demo: DemoConfig::default(),
            notifier_capacity: DEFAULT_NOTIFIER_CAPACITY,
            hashing_threads: None,
        }
    }
}

/// Shape of the synthetic block stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Number of blocks to stream.
    pub blocks: u64,
    /// Items per batch handed to the service.
    pub items_per_batch: usize,
    /// Consensus events per block; each carries one transaction.
    pub events_per_block: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            blocks: 10,
            items_per_batch: 64,
            events_per_block: 100,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum NodeConfigError {
    #[error("Invalid verification configuration: {0}")]
    Verification(#[from] ConfigError),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl NodeConfig {
    /// Validate configuration before wiring the node.
    pub fn validate(&self) -> Result<(), NodeConfigError> {
        self.verification.validate()?;
        if self.demo.items_per_batch == 0 {
            return Err(NodeConfigError::Zero("BS_DEMO_ITEMS_PER_BATCH"));
        }
        if self.notifier_capacity == 0 {
            return Err(NodeConfigError::Zero("BS_NOTIFIER_CAPACITY"));
        }
        if self.hashing_threads == Some(0) {
            return Err(NodeConfigError::Zero("BS_HASHING_THREADS"));
        }
        Ok(())
    }
}

/// Load configuration from environment variables.
///
/// # Environment Variables
///
/// - `BS_VERIFICATION_*`: see `VerificationConfig::from_env`
/// - `BS_LOG_LEVEL`, `BS_JSON_LOGS`: see `TelemetryConfig::from_env`
/// - `BS_DEMO_BLOCKS`: blocks to stream (default: 10)
/// - `BS_DEMO_ITEMS_PER_BATCH`: items per batch (default: 64)
/// - `BS_DEMO_EVENTS_PER_BLOCK`: events per block (default: 100)
/// - `BS_NOTIFIER_CAPACITY`: responses buffered per subscriber (default: 1024)
/// - `BS_HASHING_THREADS`: dedicated hashing threads (default: global pool)
pub fn load_config() -> NodeConfig {
    let mut config = NodeConfig {
        verification: VerificationConfig::from_env(),
        telemetry: TelemetryConfig::from_env(),
        ..NodeConfig::default()
    };

    if let Some(blocks) = parse_env("BS_DEMO_BLOCKS") {
        config.demo.blocks = blocks;
    }
    if let Some(items) = parse_env("BS_DEMO_ITEMS_PER_BATCH") {
        config.demo.items_per_batch = items;
    }
    if let Some(events) = parse_env("BS_DEMO_EVENTS_PER_BLOCK") {
        config.demo.events_per_block = events;
    }
    if let Some(capacity) = parse_env("BS_NOTIFIER_CAPACITY") {
        config.notifier_capacity = capacity;
    }
    config.hashing_threads = parse_env("BS_HASHING_THREADS");

    config
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring invalid configuration value");
            None
        }
    }
}
