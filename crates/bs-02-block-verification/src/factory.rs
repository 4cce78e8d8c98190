//! # Session Factory
//!
//! Configured constructor for verification sessions. Picks the tree hasher
//! and the session driver from `VerificationConfig`.

use crate::config::{HasherStrategy, SessionType, VerificationConfig};
use crate::domain::errors::VerificationError;
use crate::session::{BlockVerificationSession, SessionCollaborators};
use bs_01_streaming_hasher::{
    ConcurrentStreamingTreeHasher, NaiveStreamingTreeHasher, StreamingTreeHasher, WorkerPool,
};
use shared_types::BlockHeader;
use std::fmt;
use tokio::runtime::Handle;
use tracing::debug;

/// Execution resources shared by every session the factory builds.
#[derive(Clone, Default)]
pub struct SessionExecutors {
    /// Pool running the combination batches of concurrent hashers.
    pub hashing: WorkerPool,
    /// Runtime hosting the tasks of async sessions.
    pub sessions: Option<Handle>,
}

impl SessionExecutors {
    pub fn new(hashing: WorkerPool, sessions: Option<Handle>) -> Self {
        Self { hashing, sessions }
    }

    /// Global rayon pool plus the tokio runtime of the caller, if any.
    pub fn current() -> Self {
        Self {
            hashing: WorkerPool::global(),
            sessions: Handle::try_current().ok(),
        }
    }
}

impl fmt::Debug for SessionExecutors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionExecutors")
            .field("hashing", &self.hashing)
            .field("sessions", &self.sessions.is_some())
            .finish()
    }
}

pub struct BlockVerificationSessionFactory {
    config: VerificationConfig,
    executors: SessionExecutors,
    collaborators: SessionCollaborators,
}

impl BlockVerificationSessionFactory {
    /// # Errors
    /// * `VerificationError::InvalidInput` - invalid batch size, or async
    ///   sessions requested without a tokio runtime handle
    pub fn new(
        config: VerificationConfig,
        executors: SessionExecutors,
        collaborators: SessionCollaborators,
    ) -> Result<Self, VerificationError> {
        config.validate()?;
        if config.session_type == SessionType::Async && executors.sessions.is_none() {
            return Err(VerificationError::InvalidInput(
                "async verification sessions need a tokio runtime handle".to_string(),
            ));
        }
        Ok(Self {
            config,
            executors,
            collaborators,
        })
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &SessionCollaborators {
        &self.collaborators
    }

    /// New running session for the block opened by `header`.
    pub fn create_session(&self, header: BlockHeader) -> Result<BlockVerificationSession, VerificationError> {
        debug!(
            block_number = header.number,
            session_type = ?self.config.session_type,
            hasher = ?self.config.hasher,
            "[bs-02] Creating verification session"
        );
        let input_tree = self.new_tree()?;
        let output_tree = self.new_tree()?;
        let collaborators = self.collaborators.clone();

        match (&self.config.session_type, &self.executors.sessions) {
            (SessionType::Async, Some(runtime)) => Ok(BlockVerificationSession::spawn(
                header,
                input_tree,
                output_tree,
                collaborators,
                runtime,
                self.config.session_queue_capacity,
            )),
            (SessionType::Async, None) => Err(VerificationError::IllegalState(
                "async session requested without a runtime handle".to_string(),
            )),
            (SessionType::Sync, _) => Ok(BlockVerificationSession::inline(
                header,
                input_tree,
                output_tree,
                collaborators,
            )),
        }
    }

    fn new_tree(&self) -> Result<Box<dyn StreamingTreeHasher>, VerificationError> {
        Ok(match self.config.hasher {
            HasherStrategy::Naive => Box::new(NaiveStreamingTreeHasher::new()),
            HasherStrategy::Concurrent => Box::new(ConcurrentStreamingTreeHasher::with_batch_size(
                self.executors.hashing.clone(),
                self.config.hash_combine_batch_size,
            )?),
        })
    }
}
