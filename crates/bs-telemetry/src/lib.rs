//! # Block Stream Telemetry
//!
//! Structured logging for the block stream node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bs_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BS_SERVICE_NAME` | `block-stream-node` | Service name attached to startup logs |
//! | `BS_LOG_LEVEL` | `RUST_LOG`, then `info` | Log filter directives |
//! | `BS_JSON_LOGS` | `true` in containers | JSON instead of console formatting |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to install the global subscriber: {0}")]
    SubscriberInit(String),
}

/// Log a block-related event with standard fields.
///
/// ```rust,ignore
/// log_block_event!(info, "node", "Block acknowledged", block_number, short_hex(&hash));
/// ```
#[macro_export]
macro_rules! log_block_event {
    ($level:ident, $subsystem:expr, $msg:expr, $block_number:expr, $block_hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            block_number = $block_number,
            block_hash = %$block_hash,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_log_block_event_expands() {
        // No subscriber installed: the event is built and discarded.
        log_block_event!(info, "test", "Block acknowledged", 7u64, "abcd");
        log_block_event!(warn, "test", "Block failed", 8u64, "ef01", code = "BadStateProof");
    }
}
