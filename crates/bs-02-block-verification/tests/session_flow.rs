//! End-to-end verification sessions: valid and corrupted blocks, across the
//! sync and async drivers and both hashing strategies.

use bs_01_streaming_hasher::{
    combine, sha384, HasherError, NaiveStreamingTreeHasher, RootHashFuture, StreamingTreeHasher, TreeStatus,
    WorkerPool, EMPTY_HASHES,
};
use bs_02_block_verification::{
    AtomicVerificationMetrics, BlockNotifier, BlockVerificationSession, BlockVerificationSessionFactory,
    Ed25519SignatureVerifier,
    HasherStrategy, HashEchoSignatureVerifier, SessionCollaborators, SessionExecutors, SessionState,
    SessionType, SignatureVerifier, VerificationConfig, VerificationError, VerificationOutcome,
};
use ed25519_dalek::{Signer, SigningKey};
use parking_lot::Mutex;
use shared_types::{
    BlockHeader, BlockItem, BlockItemKind, BlockProof, Hash48, PublishStreamResponse,
    PublishStreamResponseCode,
};
use std::sync::Arc;
use tokio::runtime::Handle;

const PREVIOUS_ROOT: Hash48 = [0x11; 48];
const START_STATE_ROOT: Hash48 = [0x22; 48];

/// Notifier that records every response.
#[derive(Default)]
struct RecordingNotifier {
    responses: Mutex<Vec<PublishStreamResponse>>,
}

impl RecordingNotifier {
    fn responses(&self) -> Vec<PublishStreamResponse> {
        self.responses.lock().clone()
    }
}

impl BlockNotifier for RecordingNotifier {
    fn send_ack(&self, block_number: u64, block_hash: Hash48, already_exists: bool) {
        self.responses
            .lock()
            .push(PublishStreamResponse::ack(block_number, block_hash, already_exists));
    }

    fn send_end_of_stream(&self, block_number: u64, code: PublishStreamResponseCode) {
        self.responses
            .lock()
            .push(PublishStreamResponse::end_of_stream(block_number, code));
    }
}

struct Harness {
    factory: BlockVerificationSessionFactory,
    notifier: Arc<RecordingNotifier>,
    metrics: Arc<AtomicVerificationMetrics>,
}

fn harness(config: VerificationConfig, runtime: Option<Handle>, verifier: Arc<dyn SignatureVerifier>) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let metrics = Arc::new(AtomicVerificationMetrics::new());
    let collaborators = SessionCollaborators {
        signature_verifier: verifier,
        notifier: notifier.clone(),
        metrics: metrics.clone(),
    };
    let executors = SessionExecutors::new(WorkerPool::global(), runtime);
    let factory = BlockVerificationSessionFactory::new(config, executors, collaborators).unwrap();
    Harness {
        factory,
        notifier,
        metrics,
    }
}

fn header(number: u64) -> BlockHeader {
    BlockHeader {
        number,
        previous_block_hash: PREVIOUS_ROOT,
        block_timestamp: 1_700_000_000 + number,
    }
}

/// `[header, event_header, event_header, tx_output, tx_result]`
fn block_body(number: u64) -> Vec<BlockItem> {
    vec![
        BlockItem::from_header(&header(number)).unwrap(),
        BlockItem::new(BlockItemKind::EventHeader, b"event-1".to_vec()),
        BlockItem::new(BlockItemKind::EventHeader, b"event-2".to_vec()),
        BlockItem::new(BlockItemKind::TransactionOutput, b"output".to_vec()),
        BlockItem::new(BlockItemKind::TransactionResult, b"result".to_vec()),
    ]
}

fn leaf(item: &BlockItem) -> Hash48 {
    sha384(&item.encode().unwrap())
}

/// Block hash of `block_body`, folded by hand.
fn expected_block_hash(body: &[BlockItem]) -> Hash48 {
    let input_root = combine(&leaf(&body[1]), &leaf(&body[2]));
    let output_root = combine(
        &combine(&leaf(&body[0]), &leaf(&body[3])),
        &combine(&leaf(&body[4]), &EMPTY_HASHES[0]),
    );
    combine(
        &combine(&PREVIOUS_ROOT, &input_root),
        &combine(&output_root, &START_STATE_ROOT),
    )
}

fn proof_item(number: u64, signature: Vec<u8>) -> BlockItem {
    BlockItem::from_proof(&BlockProof {
        block: number,
        previous_block_root_hash: PREVIOUS_ROOT,
        start_of_block_state_root_hash: START_STATE_ROOT,
        block_signature: signature,
    })
    .unwrap()
}

fn valid_block(number: u64) -> (Vec<BlockItem>, Hash48) {
    let mut items = block_body(number);
    let block_hash = expected_block_hash(&items);
    items.push(proof_item(number, block_hash.to_vec()));
    (items, block_hash)
}

fn corrupt_last_byte(item: &mut BlockItem) {
    if let Some(byte) = item.payload.last_mut() {
        *byte ^= 0x01;
    }
}

fn sequential() -> VerificationConfig {
    VerificationConfig::sequential()
}

fn sync_concurrent() -> VerificationConfig {
    VerificationConfig {
        session_type: SessionType::Sync,
        hasher: HasherStrategy::Concurrent,
        hash_combine_batch_size: 2,
        ..VerificationConfig::default()
    }
}

#[test]
fn test_valid_block_completes_with_one_ack() {
    for config in [sequential(), sync_concurrent()] {
        let h = harness(config, None, Arc::new(HashEchoSignatureVerifier));
        let (items, block_hash) = valid_block(10);

        let mut session = h.factory.create_session(header(10)).unwrap();
        session.append_block_items(items);

        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(h.notifier.responses(), vec![PublishStreamResponse::ack(10, block_hash, false)]);
        let result = session.take_result().unwrap().try_recv().unwrap();
        assert_eq!(result.block_hash(), Some(block_hash));
        assert_eq!(h.metrics.snapshot().verified, 1);
    }
}

#[test]
fn test_corrupted_proof_fails_with_one_end_of_stream() {
    let h = harness(sequential(), None, Arc::new(HashEchoSignatureVerifier));
    let (mut items, _) = valid_block(11);
    if let Some(proof) = items.last_mut() {
        corrupt_last_byte(proof);
    }

    let mut session = h.factory.create_session(header(11)).unwrap();
    session.append_block_items(items);

    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(
        h.notifier.responses(),
        vec![PublishStreamResponse::end_of_stream(
            11,
            PublishStreamResponseCode::StreamItemsBadStateProof
        )]
    );
    let result = session.take_result().unwrap().try_recv().unwrap();
    assert!(matches!(
        result.outcome,
        VerificationOutcome::Failed {
            error: VerificationError::SignatureMismatch { block_number: 11, .. },
            ..
        }
    ));
    assert_eq!(h.metrics.snapshot().failed, 1);
}

#[test]
fn test_truncated_proof_is_a_parse_failure() {
    let h = harness(sequential(), None, Arc::new(HashEchoSignatureVerifier));
    let (mut items, _) = valid_block(12);
    if let Some(proof) = items.last_mut() {
        proof.payload.truncate(10);
    }

    let mut session = h.factory.create_session(header(12)).unwrap();
    session.append_block_items(items);

    let result = session.take_result().unwrap().try_recv().unwrap();
    assert!(matches!(
        result.outcome,
        VerificationOutcome::Failed {
            error: VerificationError::ParseFailure { .. },
            code: PublishStreamResponseCode::StreamItemsBadStateProof,
        }
    ));
    assert_eq!(h.notifier.responses().len(), 1);
}

#[test]
fn test_block_split_across_batches() {
    let h = harness(sync_concurrent(), None, Arc::new(HashEchoSignatureVerifier));
    let (items, block_hash) = valid_block(13);

    let mut session = h.factory.create_session(header(13)).unwrap();
    for item in items {
        session.append_block_items(vec![item]);
    }
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(h.notifier.responses(), vec![PublishStreamResponse::ack(13, block_hash, false)]);
}

#[test]
fn test_proof_in_the_middle_of_a_batch_does_not_finalize() {
    let h = harness(sequential(), None, Arc::new(HashEchoSignatureVerifier));
    let (mut items, _) = valid_block(14);
    items.push(BlockItem::new(BlockItemKind::RecordFile, vec![0]));

    let mut session = h.factory.create_session(header(14)).unwrap();
    session.append_block_items(items);
    assert_eq!(session.state(), SessionState::Running);
    assert!(h.notifier.responses().is_empty());
}

#[test]
fn test_ed25519_signed_block() {
    let signing_key = SigningKey::from_bytes(&[7u8; 32]);
    let verifier = Arc::new(Ed25519SignatureVerifier::new(signing_key.verifying_key()));
    let h = harness(sequential(), None, verifier);

    let mut items = block_body(15);
    let block_hash = expected_block_hash(&items);
    items.push(proof_item(15, signing_key.sign(&block_hash).to_bytes().to_vec()));

    let mut session = h.factory.create_session(header(15)).unwrap();
    session.append_block_items(items);
    assert_eq!(session.state(), SessionState::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_session_completes() {
    let config = VerificationConfig {
        hash_combine_batch_size: 16,
        ..VerificationConfig::default()
    };
    let h = harness(config, Some(Handle::current()), Arc::new(HashEchoSignatureVerifier));

    // Pad the output tree past the pooled batch size.
    let mut items = block_body(16);
    for i in 0..200u32 {
        items.push(BlockItem::new(BlockItemKind::StateChanges, i.to_le_bytes().to_vec()));
    }
    let block_hash = bs_02_block_verification::compute_block_hash(&items, &PREVIOUS_ROOT, &START_STATE_ROOT).unwrap();

    let mut session = h.factory.create_session(header(16)).unwrap();
    let result = session.take_result().unwrap();
    let (head, tail) = items.split_at(100);
    session.append_block_items(head.to_vec());
    session.append_block_items(tail.to_vec());
    session.append_block_items(vec![proof_item(16, block_hash.to_vec())]);

    let result = result.await.unwrap();
    assert_eq!(result.block_hash(), Some(block_hash));
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(h.notifier.responses(), vec![PublishStreamResponse::ack(16, block_hash, false)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_session_failure_is_reported_once() {
    let h = harness(VerificationConfig::default(), Some(Handle::current()), Arc::new(HashEchoSignatureVerifier));
    let (items, _) = valid_block(17);

    let mut session = h.factory.create_session(header(17)).unwrap();
    let result = session.take_result().unwrap();
    let mut corrupted = items.clone();
    if let Some(proof) = corrupted.last_mut() {
        corrupt_last_byte(proof);
    }
    session.append_block_items(corrupted);

    let result = result.await.unwrap();
    assert!(!result.is_verified());
    assert_eq!(session.state(), SessionState::Failed);

    // A late proof for the same block is ignored.
    session.append_block_items(vec![items[items.len() - 1].clone()]);
    assert_eq!(h.notifier.responses().len(), 1);
}

/// Verifier that panics on every call.
struct PanickingVerifier;

impl SignatureVerifier for PanickingVerifier {
    fn verify(&self, _block_hash: &Hash48, _signature: &[u8]) -> bool {
        panic!("signature backend crashed")
    }
}

/// Hasher whose every leaf fails.
struct BrokenHasher;

impl StreamingTreeHasher for BrokenHasher {
    fn add_leaf(&mut self, _leaf: &[u8]) -> Result<(), HasherError> {
        Err(HasherError::Cancelled)
    }

    fn root_hash(&mut self) -> Result<RootHashFuture, HasherError> {
        Err(HasherError::Cancelled)
    }

    fn status(&mut self) -> Result<TreeStatus, HasherError> {
        Ok(TreeStatus::EMPTY)
    }

    fn num_leaves(&self) -> u64 {
        0
    }
}

fn recording_collaborators(notifier: Arc<RecordingNotifier>) -> SessionCollaborators {
    SessionCollaborators {
        signature_verifier: Arc::new(HashEchoSignatureVerifier),
        notifier,
        metrics: Arc::new(AtomicVerificationMetrics::new()),
    }
}

fn assert_unrecoverable(outcome: &VerificationOutcome) {
    assert!(matches!(
        outcome,
        VerificationOutcome::Failed {
            error: VerificationError::Unrecoverable(_),
            code: PublishStreamResponseCode::StreamItemsInternalError,
        }
    ));
}

#[test]
fn test_panicking_verifier_fails_sync_session() {
    let h = harness(sequential(), None, Arc::new(PanickingVerifier));
    let (items, _) = valid_block(18);

    let mut session = h.factory.create_session(header(18)).unwrap();
    let mut result = session.take_result().unwrap();
    session.append_block_items(items);

    assert_eq!(session.state(), SessionState::Failed);
    assert_unrecoverable(&result.try_recv().unwrap().outcome);
    assert_eq!(
        h.notifier.responses(),
        vec![PublishStreamResponse::end_of_stream(18, PublishStreamResponseCode::StreamItemsInternalError)]
    );
    assert_eq!(h.metrics.snapshot().failed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_verifier_fails_async_session() {
    let h = harness(VerificationConfig::default(), Some(Handle::current()), Arc::new(PanickingVerifier));
    let (items, _) = valid_block(19);

    let mut session = h.factory.create_session(header(19)).unwrap();
    let result = session.take_result().unwrap();
    session.append_block_items(items);

    let result = result.await.unwrap();
    assert_unrecoverable(&result.outcome);
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(
        h.notifier.responses(),
        vec![PublishStreamResponse::end_of_stream(19, PublishStreamResponseCode::StreamItemsInternalError)]
    );
}

#[test]
fn test_hasher_error_fails_session_once() {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = BlockVerificationSession::inline(
        header(20),
        Box::new(BrokenHasher),
        Box::new(NaiveStreamingTreeHasher::new()),
        recording_collaborators(notifier.clone()),
    );
    let mut result = session.take_result().unwrap();

    // The first input-tree leaf fails the session mid-batch.
    session.append_block_items(block_body(20));
    assert_eq!(session.state(), SessionState::Failed);
    assert_unrecoverable(&result.try_recv().unwrap().outcome);

    let (items, _) = valid_block(20);
    session.append_block_items(items);
    assert_eq!(
        notifier.responses(),
        vec![PublishStreamResponse::end_of_stream(20, PublishStreamResponseCode::StreamItemsInternalError)]
    );
}

#[tokio::test]
async fn test_full_session_queue_fails_session() {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut session = BlockVerificationSession::spawn(
        header(21),
        Box::new(NaiveStreamingTreeHasher::new()),
        Box::new(NaiveStreamingTreeHasher::new()),
        recording_collaborators(notifier.clone()),
        &Handle::current(),
        2,
    );
    let result = session.take_result().unwrap();

    // The session task cannot run before the test yields, so the third
    // batch finds the queue full.
    let (items, _) = valid_block(21);
    for item in items {
        session.append_block_items(vec![item]);
    }

    let result = result.await.unwrap();
    assert_unrecoverable(&result.outcome);
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(
        notifier.responses(),
        vec![PublishStreamResponse::end_of_stream(21, PublishStreamResponseCode::StreamItemsInternalError)]
    );
}
