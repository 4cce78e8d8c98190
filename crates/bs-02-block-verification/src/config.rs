//! Verification configuration from environment variables.

use crate::domain::errors::VerificationError;
use bs_01_streaming_hasher::DEFAULT_HASH_COMBINE_BATCH_SIZE;
use std::env;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Errors in the verification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Hash combine batch size must be positive and even, got {0}")]
    InvalidBatchSize(usize),

    #[error("Session queue capacity must be positive")]
    ZeroQueueCapacity,

    #[error("Unknown {field} value: {value}")]
    UnknownValue { field: &'static str, value: String },
}

impl From<ConfigError> for VerificationError {
    fn from(err: ConfigError) -> Self {
        VerificationError::InvalidInput(err.to_string())
    }
}

/// Which verification service the node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceType {
    #[default]
    Production,
    /// Accepts and drops every item.
    NoOp,
}

impl FromStr for ServiceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRODUCTION" => Ok(Self::Production),
            "NO_OP" | "NOOP" => Ok(Self::NoOp),
            _ => Err(ConfigError::UnknownValue {
                field: "service type",
                value: s.to_string(),
            }),
        }
    }
}

/// Where a session processes its batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionType {
    /// On the thread that appends the batch.
    Sync,
    /// On a per-session task, in arrival order.
    #[default]
    Async,
}

impl FromStr for SessionType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SYNC" => Ok(Self::Sync),
            "ASYNC" => Ok(Self::Async),
            _ => Err(ConfigError::UnknownValue {
                field: "session type",
                value: s.to_string(),
            }),
        }
    }
}

/// Tree hasher used for both trees of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HasherStrategy {
    Naive,
    #[default]
    Concurrent,
}

impl FromStr for HasherStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NAIVE" => Ok(Self::Naive),
            "CONCURRENT" => Ok(Self::Concurrent),
            _ => Err(ConfigError::UnknownValue {
                field: "hasher",
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration of the verification subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationConfig {
    pub service_type: ServiceType,
    pub session_type: SessionType,
    pub hasher: HasherStrategy,
    /// Hashes combined per job by the concurrent hasher.
    pub hash_combine_batch_size: usize,
    /// Batches an async session may have queued before it fails.
    pub session_queue_capacity: usize,
}

/// Default bound of the async session queue, in batches.
pub const DEFAULT_SESSION_QUEUE_CAPACITY: usize = 1024;

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            service_type: ServiceType::Production,
            session_type: SessionType::Async,
            hasher: HasherStrategy::Concurrent,
            hash_combine_batch_size: 32,
            session_queue_capacity: DEFAULT_SESSION_QUEUE_CAPACITY,
        }
    }
}

impl VerificationConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BS_VERIFICATION_TYPE`: `PRODUCTION` or `NO_OP` (default: PRODUCTION)
    /// - `BS_VERIFICATION_SESSION_TYPE`: `SYNC` or `ASYNC` (default: ASYNC)
    /// - `BS_VERIFICATION_HASHER`: `NAIVE` or `CONCURRENT` (default: CONCURRENT)
    /// - `BS_VERIFICATION_HASH_COMBINE_BATCH_SIZE`: positive even integer (default: 32)
    /// - `BS_VERIFICATION_SESSION_QUEUE_CAPACITY`: batches queued per async session (default: 1024)
    ///
    /// Unparsable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_type: env_or("BS_VERIFICATION_TYPE", defaults.service_type),
            session_type: env_or("BS_VERIFICATION_SESSION_TYPE", defaults.session_type),
            hasher: env_or("BS_VERIFICATION_HASHER", defaults.hasher),
            hash_combine_batch_size: env_or(
                "BS_VERIFICATION_HASH_COMBINE_BATCH_SIZE",
                defaults.hash_combine_batch_size,
            ),
            session_queue_capacity: env_or(
                "BS_VERIFICATION_SESSION_QUEUE_CAPACITY",
                defaults.session_queue_capacity,
            ),
        }
    }

    /// Configuration for the sequential path: sync sessions on naive hashers.
    pub fn sequential() -> Self {
        Self {
            session_type: SessionType::Sync,
            hasher: HasherStrategy::Naive,
            hash_combine_batch_size: DEFAULT_HASH_COMBINE_BATCH_SIZE,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.hash_combine_batch_size;
        if size == 0 || size % 2 != 0 {
            return Err(ConfigError::InvalidBatchSize(size));
        }
        if self.session_queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Debug + Copy,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!(variable = name, value = %raw, error = %e, fallback = ?default, "[bs-02] Ignoring invalid configuration value");
            default
        }),
        Err(_) => default,
    }
}
