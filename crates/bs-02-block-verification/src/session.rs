//! # Block Verification Session
//!
//! One session per block number. It hashes classified items into the input
//! and output trees and, when the block proof arrives as the last item of a
//! batch, finalizes both trees and checks the proof signature.
//!
//! A session is driven either inline, on the thread appending a batch, or by
//! a dedicated tokio task fed through a bounded queue. Both drivers run the
//! same `SessionCore`, so the two variants only differ in where batches are
//! processed.
//!
//! A panic while processing a batch fails the session with
//! `VerificationError::Unrecoverable`; it never escapes to the caller.

use crate::domain::block_hash::{compose_block_hash, leaf_hash};
use crate::domain::classify::{classify, TreeSide};
use crate::domain::entities::{SessionState, SessionStateCell, VerificationResult};
use crate::domain::errors::VerificationError;
use crate::ports::outbound::{BlockNotifier, SignatureVerifier, VerificationMetrics};
use bs_01_streaming_hasher::StreamingTreeHasher;
use shared_types::{short_hex, BlockHeader, BlockItem, BlockProof, Hash48};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Outbound ports a session reports through.
#[derive(Clone)]
pub struct SessionCollaborators {
    pub signature_verifier: Arc<dyn SignatureVerifier>,
    pub notifier: Arc<dyn BlockNotifier>,
    pub metrics: Arc<dyn VerificationMetrics>,
}

/// Handle to the session verifying one block.
pub struct BlockVerificationSession {
    block_number: u64,
    state: Arc<SessionStateCell>,
    driver: SessionDriver,
    result: Option<oneshot::Receiver<VerificationResult>>,
}

enum SessionDriver {
    Inline(Box<SessionCore>),
    Task {
        sender: mpsc::Sender<Vec<BlockItem>>,
        overflowed: Arc<AtomicBool>,
    },
}

impl BlockVerificationSession {
    /// Session processing every batch on the appending thread.
    ///
    /// `append_block_items` blocks the caller until the batch is hashed and,
    /// for the last batch, until both roots are ready. Do not drive an inline
    /// session from a tokio worker that other tasks depend on.
    pub fn inline(
        header: BlockHeader,
        input_tree: Box<dyn StreamingTreeHasher>,
        output_tree: Box<dyn StreamingTreeHasher>,
        collaborators: SessionCollaborators,
    ) -> Self {
        let (core, result) = SessionCore::new(header, input_tree, output_tree, collaborators);
        Self {
            block_number: core.block_number,
            state: Arc::clone(&core.state),
            driver: SessionDriver::Inline(Box::new(core)),
            result: Some(result),
        }
    }

    /// Session processing batches in order on a task spawned on `runtime`.
    ///
    /// At most `queue_capacity` batches wait for the task. A batch that does
    /// not fit fails the session once the task reaches the queue's end.
    /// The task ends once the session reaches a terminal state or the handle
    /// is dropped.
    pub fn spawn(
        header: BlockHeader,
        input_tree: Box<dyn StreamingTreeHasher>,
        output_tree: Box<dyn StreamingTreeHasher>,
        collaborators: SessionCollaborators,
        runtime: &Handle,
        queue_capacity: usize,
    ) -> Self {
        let (mut core, result) = SessionCore::new(header, input_tree, output_tree, collaborators);
        let block_number = core.block_number;
        let state = Arc::clone(&core.state);
        let queue_capacity = queue_capacity.max(1);
        let (sender, mut receiver) = mpsc::channel::<Vec<BlockItem>>(queue_capacity);
        let overflowed = Arc::new(AtomicBool::new(false));
        let task_overflowed = Arc::clone(&overflowed);

        runtime.spawn(async move {
            while let Some(items) = receiver.recv().await {
                if task_overflowed.load(Ordering::Acquire) {
                    core.fail(VerificationError::Unrecoverable(format!(
                        "session queue overflowed ({queue_capacity} batches)"
                    )));
                    break;
                }
                core.handle_batch_guarded(items).await;
                if !core.state.is_running() {
                    break;
                }
            }
            debug!(block_number = core.block_number, state = ?core.state.get(), "[bs-02] Session task finished");
        });

        Self {
            block_number,
            state,
            driver: SessionDriver::Task { sender, overflowed },
            result: Some(result),
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Hand a batch of items to the session.
    ///
    /// Ignored with a warning once the session is no longer running. The
    /// inline driver returns after the batch is processed; the task driver
    /// returns as soon as the batch is queued.
    pub fn append_block_items(&mut self, items: Vec<BlockItem>) {
        if !self.is_running() {
            warn!(block_number = self.block_number, items = items.len(), "[bs-02] Block verification session is not running");
            return;
        }
        match &mut self.driver {
            SessionDriver::Inline(core) => futures::executor::block_on(core.handle_batch_guarded(items)),
            SessionDriver::Task { sender, overflowed } => match sender.try_send(items) {
                Ok(()) => {}
                Err(TrySendError::Full(items)) => {
                    overflowed.store(true, Ordering::Release);
                    warn!(block_number = self.block_number, items = items.len(), "[bs-02] Session queue is full, dropping items");
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(block_number = self.block_number, "[bs-02] Session task has stopped, dropping items");
                }
            },
        }
    }

    /// Receiver for the terminal outcome. Can be taken once.
    pub fn take_result(&mut self) -> Option<oneshot::Receiver<VerificationResult>> {
        self.result.take()
    }
}

/// State and trees of one session. Owned by exactly one driver.
struct SessionCore {
    block_number: u64,
    input_tree: Box<dyn StreamingTreeHasher>,
    output_tree: Box<dyn StreamingTreeHasher>,
    state: Arc<SessionStateCell>,
    collaborators: SessionCollaborators,
    result: Option<oneshot::Sender<VerificationResult>>,
}

impl SessionCore {
    fn new(
        header: BlockHeader,
        input_tree: Box<dyn StreamingTreeHasher>,
        output_tree: Box<dyn StreamingTreeHasher>,
        collaborators: SessionCollaborators,
    ) -> (Self, oneshot::Receiver<VerificationResult>) {
        let (sender, receiver) = oneshot::channel();
        let core = Self {
            block_number: header.number,
            input_tree,
            output_tree,
            state: Arc::new(SessionStateCell::new()),
            collaborators,
            result: Some(sender),
        };
        (core, receiver)
    }

    /// `handle_batch`, turning a panic into a failed session.
    async fn handle_batch_guarded(&mut self, items: Vec<BlockItem>) {
        let outcome = AssertUnwindSafe(self.handle_batch(items)).catch_unwind().await;
        if let Err(panic) = outcome {
            self.fail(VerificationError::Unrecoverable(format!(
                "panic while processing block items: {}",
                panic_message(panic.as_ref())
            )));
        }
    }

    async fn handle_batch(&mut self, items: Vec<BlockItem>) {
        if !self.state.is_running() {
            warn!(block_number = self.block_number, items = items.len(), "[bs-02] Block verification session is not running");
            return;
        }
        debug!(block_number = self.block_number, items = items.len(), "[bs-02] Processing block items");

        match self.process_batch(&items).await {
            Ok(Some(block_hash)) => self.complete(block_hash),
            Ok(None) => {}
            Err(error) => self.fail(error),
        }
    }

    /// Hash the batch; finalize if it ends with the block proof.
    async fn process_batch(&mut self, items: &[BlockItem]) -> Result<Option<Hash48>, VerificationError> {
        for item in items {
            match classify(item.kind) {
                Some(TreeSide::Input) => self.input_tree.add_leaf(&leaf_hash(item)?)?,
                Some(TreeSide::Output) => self.output_tree.add_leaf(&leaf_hash(item)?)?,
                None => {}
            }
        }

        let Some(last) = items.last() else {
            return Ok(None);
        };
        if !last.is_block_proof() {
            return Ok(None);
        }
        let proof = last.decode_proof().map_err(|e| VerificationError::ParseFailure {
            item: "BlockProof",
            reason: e.to_string(),
        })?;
        self.finalize(&proof).await.map(Some)
    }

    async fn finalize(&mut self, proof: &BlockProof) -> Result<Hash48, VerificationError> {
        if proof.block != self.block_number {
            return Err(VerificationError::BlockNumberMismatch {
                session_block: self.block_number,
                proof_block: proof.block,
            });
        }

        let input_root = self.input_tree.root_hash()?;
        let output_root = self.output_tree.root_hash()?;
        let (input_root, output_root) = futures::future::try_join(input_root, output_root).await?;
        let block_hash = compose_block_hash(proof, &input_root, &output_root);

        debug!(
            block_number = self.block_number,
            leaves = self.input_tree.num_leaves() + self.output_tree.num_leaves(),
            root = %short_hex(&block_hash),
            "[bs-02] Block hash composed"
        );

        if !self
            .collaborators
            .signature_verifier
            .verify(&block_hash, &proof.block_signature)
        {
            return Err(VerificationError::SignatureMismatch {
                block_number: self.block_number,
                block_hash: short_hex(&block_hash),
            });
        }
        Ok(block_hash)
    }

    fn complete(&mut self, block_hash: Hash48) {
        let Some(result) = self.result.take() else {
            return;
        };
        self.state.set(SessionState::Completed);
        self.collaborators.metrics.block_verified();
        info!(block_number = self.block_number, root = %short_hex(&block_hash), "[bs-02] Block verified");
        self.collaborators
            .notifier
            .send_ack(self.block_number, block_hash, false);
        // Nobody listening for the result is fine; the notifier already knows.
        let _ = result.send(VerificationResult::verified(self.block_number, block_hash));
    }

    fn fail(&mut self, error: VerificationError) {
        let Some(result) = self.result.take() else {
            return;
        };
        self.state.set(SessionState::Failed);
        let code = error.response_code();
        self.collaborators.metrics.block_failed(code);
        error!(block_number = self.block_number, ?code, %error, "[bs-02] Block verification failed");
        self.collaborators
            .notifier
            .send_end_of_stream(self.block_number, code);
        let _ = result.send(VerificationResult::failed(self.block_number, error));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
