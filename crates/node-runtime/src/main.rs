//! # Block Stream Node
//!
//! Entry point of the block stream verification node.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from env)
//! 2. Install logging
//! 3. Wire the verification service, notifier and metrics
//! 4. Stream the synthetic producer's blocks through the service
//! 5. Report and exit, or stop early on Ctrl+C

use anyhow::{Context, Result};
use tracing::info;

use node_runtime::config::load_config;
use node_runtime::NodeRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();
    bs_telemetry::init_logging(&config.telemetry).context("Failed to initialize logging")?;

    info!("===========================================");
    info!("  Block Stream Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let runtime = NodeRuntime::new(config)?;
    let logger = runtime.spawn_response_logger();

    tokio::select! {
        report = runtime.run_demo() => {
            let report = report?;
            info!(
                blocks = report.blocks,
                items = report.items,
                acknowledged = report.acknowledged,
                failed = report.failed,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Demo stream finished"
            );
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Shutdown signal received");
        }
    }

    logger.abort();
    Ok(())
}
