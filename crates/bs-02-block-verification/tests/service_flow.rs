//! The verification service routing producer batches to sessions.

use bs_02_block_verification::{
    build_verification_service, compute_block_hash, AtomicVerificationMetrics, BlockVerificationApi,
    BlockVerificationService, BlockVerificationSessionFactory, BroadcastNotifier, HashEchoSignatureVerifier,
    ServiceType, SessionCollaborators, SessionExecutors, SessionState, VerificationConfig, VerificationError,
};
use shared_types::{
    BlockHeader, BlockItem, BlockItemKind, BlockProof, Hash48, PublishStreamResponse,
    PublishStreamResponseCode,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn factory(
    config: VerificationConfig,
    notifier: Arc<BroadcastNotifier>,
    metrics: Arc<AtomicVerificationMetrics>,
) -> BlockVerificationSessionFactory {
    let collaborators = SessionCollaborators {
        signature_verifier: Arc::new(HashEchoSignatureVerifier),
        notifier,
        metrics,
    };
    BlockVerificationSessionFactory::new(config, SessionExecutors::current(), collaborators).unwrap()
}

fn block(number: u64, events: usize) -> (Vec<BlockItem>, Hash48) {
    let previous = [number as u8; 48];
    let state = [0xaa; 48];
    let header = BlockHeader {
        number,
        previous_block_hash: previous,
        block_timestamp: number,
    };
    let mut items = vec![BlockItem::from_header(&header).unwrap()];
    for i in 0..events {
        items.push(BlockItem::new(BlockItemKind::EventTransaction, vec![i as u8; 32]));
        items.push(BlockItem::new(BlockItemKind::TransactionResult, vec![i as u8; 8]));
    }
    let block_hash = compute_block_hash(&items, &previous, &state).unwrap();
    items.push(
        BlockItem::from_proof(&BlockProof {
            block: number,
            previous_block_root_hash: previous,
            start_of_block_state_root_hash: state,
            block_signature: block_hash.to_vec(),
        })
        .unwrap(),
    );
    (items, block_hash)
}

#[test]
fn test_consecutive_blocks_are_acknowledged() {
    let notifier = Arc::new(BroadcastNotifier::new(16));
    let mut responses = notifier.subscribe();
    let metrics = Arc::new(AtomicVerificationMetrics::new());
    let service = BlockVerificationService::new(factory(
        VerificationConfig::sequential(),
        notifier.clone(),
        metrics.clone(),
    ));

    for number in 1..=3 {
        let (items, block_hash) = block(number, 5);
        service.on_block_items_received(items).unwrap();
        assert_eq!(service.current_session(), Some((number, SessionState::Completed)));
        assert_eq!(
            responses.try_recv().unwrap(),
            PublishStreamResponse::ack(number, block_hash, false)
        );
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.received, 3);
    assert_eq!(snapshot.verified, 3);
    assert_eq!(snapshot.failed, 0);
}

#[test]
fn test_items_without_session_are_dropped() {
    let notifier = Arc::new(BroadcastNotifier::default());
    let service = BlockVerificationService::new(factory(
        VerificationConfig::sequential(),
        notifier.clone(),
        Arc::new(AtomicVerificationMetrics::new()),
    ));

    let orphan = vec![BlockItem::new(BlockItemKind::EventHeader, vec![1])];
    assert!(service.on_block_items_received(orphan).is_ok());
    assert!(service.on_block_items_received(Vec::new()).is_ok());
    assert_eq!(service.current_session(), None);
    assert_eq!(notifier.published_count(), 0);
}

#[test]
fn test_undecodable_header_is_returned_to_caller() {
    let service = BlockVerificationService::new(factory(
        VerificationConfig::sequential(),
        Arc::new(BroadcastNotifier::default()),
        Arc::new(AtomicVerificationMetrics::new()),
    ));
    let result = service.on_block_items_received(vec![BlockItem::new(BlockItemKind::BlockHeader, vec![1, 2])]);
    assert!(matches!(result, Err(VerificationError::ParseFailure { item: "BlockHeader", .. })));
}

#[test]
fn test_new_header_replaces_running_session() {
    let notifier = Arc::new(BroadcastNotifier::default());
    let metrics = Arc::new(AtomicVerificationMetrics::new());
    let service = BlockVerificationService::new(factory(
        VerificationConfig::sequential(),
        notifier.clone(),
        metrics.clone(),
    ));

    let (first, _) = block(20, 2);
    service
        .on_block_items_received(first[..first.len() - 1].to_vec())
        .unwrap();
    assert_eq!(service.current_session(), Some((20, SessionState::Running)));

    let (second, _) = block(21, 2);
    service.on_block_items_received(second).unwrap();
    assert_eq!(service.current_session(), Some((21, SessionState::Completed)));
    assert_eq!(metrics.snapshot().received, 2);
    assert_eq!(notifier.published_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_service_acknowledges_through_broadcast() {
    let notifier = Arc::new(BroadcastNotifier::new(16));
    let mut responses = notifier.subscribe();
    let service = BlockVerificationService::new(factory(
        VerificationConfig::default(),
        notifier.clone(),
        Arc::new(AtomicVerificationMetrics::new()),
    ));

    let (items, block_hash) = block(30, 40);
    let (head, tail) = items.split_at(items.len() / 2);
    service.on_block_items_received(head.to_vec()).unwrap();
    service.on_block_items_received(tail.to_vec()).unwrap();

    let response = timeout(Duration::from_secs(10), responses.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response, PublishStreamResponse::ack(30, block_hash, false));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_service_reports_bad_proof() {
    let notifier = Arc::new(BroadcastNotifier::new(16));
    let mut responses = notifier.subscribe();
    let service = BlockVerificationService::new(factory(
        VerificationConfig::default(),
        notifier.clone(),
        Arc::new(AtomicVerificationMetrics::new()),
    ));

    let (mut items, _) = block(31, 3);
    if let Some(byte) = items.last_mut().and_then(|proof| proof.payload.last_mut()) {
        *byte ^= 0xff;
    }
    service.on_block_items_received(items).unwrap();

    let response = timeout(Duration::from_secs(10), responses.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        response,
        PublishStreamResponse::end_of_stream(31, PublishStreamResponseCode::StreamItemsBadStateProof)
    );
}

#[test]
fn test_noop_service_selected_by_config() {
    let notifier = Arc::new(BroadcastNotifier::default());
    let config = VerificationConfig {
        service_type: ServiceType::NoOp,
        ..VerificationConfig::sequential()
    };
    let service = build_verification_service(
        &config,
        factory(config.clone(), notifier.clone(), Arc::new(AtomicVerificationMetrics::new())),
    );
    let (items, _) = block(40, 1);
    service.on_block_items_received(items).unwrap();
    assert_eq!(notifier.published_count(), 0);
}
