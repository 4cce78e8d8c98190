//! # Verification Service
//!
//! Implements `BlockVerificationApi`: opens a session for every block header
//! and routes the following batches to it.

use crate::config::{ServiceType, VerificationConfig};
use crate::domain::entities::SessionState;
use crate::domain::errors::VerificationError;
use crate::factory::BlockVerificationSessionFactory;
use crate::ports::inbound::BlockVerificationApi;
use crate::session::BlockVerificationSession;
use parking_lot::Mutex;
use shared_types::BlockItem;
use tracing::{debug, warn};

/// Production verification service.
///
/// Holds at most one current session. Producers stream blocks one after the
/// other, so a new header replaces the previous session.
pub struct BlockVerificationService {
    factory: BlockVerificationSessionFactory,
    current: Mutex<Option<BlockVerificationSession>>,
}

impl BlockVerificationService {
    pub fn new(factory: BlockVerificationSessionFactory) -> Self {
        Self {
            factory,
            current: Mutex::new(None),
        }
    }

    /// Block number and state of the current session.
    pub fn current_session(&self) -> Option<(u64, SessionState)> {
        self.current
            .lock()
            .as_ref()
            .map(|session| (session.block_number(), session.state()))
    }
}

impl BlockVerificationApi for BlockVerificationService {
    fn on_block_items_received(&self, items: Vec<BlockItem>) -> Result<(), VerificationError> {
        let Some(first) = items.first() else {
            return Ok(());
        };

        let mut current = self.current.lock();
        if first.is_block_header() {
            let header = first.decode_header().map_err(|e| VerificationError::ParseFailure {
                item: "BlockHeader",
                reason: e.to_string(),
            })?;
            if let Some(previous) = current.as_ref().filter(|session| session.is_running()) {
                warn!(
                    previous = previous.block_number(),
                    block_number = header.number,
                    "[bs-02] Previous verification session is still running, replacing it"
                );
            }
            self.factory.collaborators().metrics.block_received();
            *current = Some(self.factory.create_session(header)?);
        }

        match current.as_mut() {
            Some(session) => {
                session.append_block_items(items);
                Ok(())
            }
            None => {
                warn!(items = items.len(), "[bs-02] No verification session open, dropping items");
                Ok(())
            }
        }
    }
}

/// Service that accepts every batch and verifies nothing.
#[derive(Debug, Default)]
pub struct NoOpBlockVerificationService;

impl BlockVerificationApi for NoOpBlockVerificationService {
    fn on_block_items_received(&self, items: Vec<BlockItem>) -> Result<(), VerificationError> {
        debug!(items = items.len(), "[bs-02] Verification disabled, ignoring items");
        Ok(())
    }
}

/// Service selected by `config.service_type`.
pub fn build_verification_service(
    config: &VerificationConfig,
    factory: BlockVerificationSessionFactory,
) -> Box<dyn BlockVerificationApi> {
    match config.service_type {
        ServiceType::Production => Box::new(BlockVerificationService::new(factory)),
        ServiceType::NoOp => Box::new(NoOpBlockVerificationService),
    }
}
