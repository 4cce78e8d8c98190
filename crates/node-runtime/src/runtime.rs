//! # Node Runtime
//!
//! Owns the verification service and its collaborators, and runs the demo
//! producer stream against it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use bs_01_streaming_hasher::WorkerPool;
use bs_02_block_verification::{
    build_verification_service, AtomicVerificationMetrics, BlockVerificationApi,
    BlockVerificationSessionFactory, BroadcastNotifier, HashEchoSignatureVerifier,
    PrometheusVerificationMetrics, ServiceType, SessionCollaborators, SessionExecutors,
    VerificationMetrics, VerificationMetricsSnapshot,
};
use bs_telemetry::log_block_event;
use shared_types::{short_hex, PublishStreamResponse, PublishStreamResponseCode};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::producer::SyntheticProducer;

/// How long the demo waits for the outcome of one block.
const BLOCK_OUTCOME_TIMEOUT: Duration = Duration::from_secs(30);

/// Counts locally and forwards to the exported counters.
struct NodeMetrics {
    local: Arc<AtomicVerificationMetrics>,
    exported: PrometheusVerificationMetrics,
}

impl VerificationMetrics for NodeMetrics {
    fn block_received(&self) {
        self.local.block_received();
        self.exported.block_received();
    }

    fn block_verified(&self) {
        self.local.block_verified();
        self.exported.block_verified();
    }

    fn block_failed(&self, code: PublishStreamResponseCode) {
        self.local.block_failed(code);
        self.exported.block_failed(code);
    }
}

/// Summary of a demo run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoReport {
    pub blocks: u64,
    pub items: usize,
    pub acknowledged: u64,
    pub failed: u64,
    pub metrics: VerificationMetricsSnapshot,
    pub elapsed: Duration,
}

/// The wired node.
pub struct NodeRuntime {
    config: NodeConfig,
    service: Box<dyn BlockVerificationApi>,
    notifier: Arc<BroadcastNotifier>,
    metrics: Arc<AtomicVerificationMetrics>,
}

impl NodeRuntime {
    /// Wire the node. Must be called inside a tokio runtime when async
    /// sessions are configured.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let hashing = match config.hashing_threads {
            Some(threads) => WorkerPool::dedicated(threads).context("Failed to build hashing pool")?,
            None => WorkerPool::global(),
        };
        let executors = SessionExecutors::new(hashing, tokio::runtime::Handle::try_current().ok());

        let notifier = Arc::new(BroadcastNotifier::new(config.notifier_capacity));
        let metrics = Arc::new(AtomicVerificationMetrics::new());
        let collaborators = SessionCollaborators {
            signature_verifier: Arc::new(HashEchoSignatureVerifier),
            notifier: notifier.clone(),
            metrics: Arc::new(NodeMetrics {
                local: metrics.clone(),
                exported: PrometheusVerificationMetrics,
            }),
        };

        let factory = BlockVerificationSessionFactory::new(config.verification.clone(), executors, collaborators)
            .context("Failed to build verification session factory")?;
        let service = build_verification_service(&config.verification, factory);

        info!(
            service_type = ?config.verification.service_type,
            session_type = ?config.verification.session_type,
            hasher = ?config.verification.hasher,
            batch_size = config.verification.hash_combine_batch_size,
            "Verification service ready"
        );

        Ok(Self {
            config,
            service,
            notifier,
            metrics,
        })
    }

    pub fn notifier(&self) -> &Arc<BroadcastNotifier> {
        &self.notifier
    }

    /// Log every response published to producers until the notifier closes.
    pub fn spawn_response_logger(&self) -> JoinHandle<()> {
        let mut responses = self.notifier.subscribe();
        tokio::spawn(async move {
            loop {
                match responses.recv().await {
                    Ok(PublishStreamResponse::Acknowledgement(ack)) => log_block_event!(
                        info,
                        "node",
                        "Block acknowledged",
                        ack.block_number,
                        short_hex(&ack.block_root_hash)
                    ),
                    Ok(PublishStreamResponse::EndOfStream(eos)) => {
                        warn!(block_number = eos.block_number, code = ?eos.status, "Producer stream ended")
                    }
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "Response logger lagged behind"),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Stream the configured number of synthetic blocks and wait for each
    /// block's outcome.
    pub async fn run_demo(&self) -> Result<DemoReport> {
        let demo = &self.config.demo;
        let mut producer = SyntheticProducer::new(demo.events_per_block, demo.items_per_batch);
        let mut responses = self.notifier.subscribe();
        let expect_outcomes = self.config.verification.service_type == ServiceType::Production;

        let started = Instant::now();
        let mut items = 0;
        let mut acknowledged = 0;
        let mut failed = 0;

        for _ in 0..demo.blocks {
            let block = producer.next_block().context("Failed to produce block")?;
            items += block.item_count();
            for batch in block.batches {
                self.service
                    .on_block_items_received(batch)
                    .with_context(|| format!("Block {} rejected", block.number))?;
            }
            if !expect_outcomes {
                continue;
            }

            let response = tokio::time::timeout(BLOCK_OUTCOME_TIMEOUT, responses.recv())
                .await
                .with_context(|| format!("No outcome for block {}", block.number))?
                .context("Notifier closed")?;
            match response {
                PublishStreamResponse::Acknowledgement(ack) if ack.block_root_hash == block.block_hash => {
                    acknowledged += 1
                }
                PublishStreamResponse::Acknowledgement(ack) => bail!(
                    "Block {} acknowledged with unexpected root {}",
                    ack.block_number,
                    short_hex(&ack.block_root_hash)
                ),
                PublishStreamResponse::EndOfStream(_) => failed += 1,
            }
        }

        Ok(DemoReport {
            blocks: demo.blocks,
            items,
            acknowledged,
            failed,
            metrics: self.metrics.snapshot(),
            elapsed: started.elapsed(),
        })
    }
}
