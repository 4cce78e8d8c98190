//! Broadcast Notifier Adapter
//!
//! Publishes acknowledgements and end-of-stream responses to every producer
//! stream subscribed to the node.

use crate::ports::outbound::BlockNotifier;
use shared_types::{short_hex, Hash48, PublishStreamResponse, PublishStreamResponseCode};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default number of responses buffered per subscriber.
pub const DEFAULT_NOTIFIER_CAPACITY: usize = 1024;

/// Fans responses out over a `tokio::sync::broadcast` channel.
///
/// A subscriber that falls more than `capacity` responses behind loses the
/// oldest ones.
#[derive(Debug)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<PublishStreamResponse>,
    published: AtomicU64,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishStreamResponse> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Responses published so far, delivered or not.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    fn publish(&self, response: PublishStreamResponse) {
        self.published.fetch_add(1, Ordering::Relaxed);
        let block_number = response.block_number();
        match self.sender.send(response) {
            Ok(receivers) => trace!(block_number, receivers, "[bs-02] Response published"),
            Err(_) => debug!(block_number, "[bs-02] No producer subscribed, response dropped"),
        }
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFIER_CAPACITY)
    }
}

impl BlockNotifier for BroadcastNotifier {
    fn send_ack(&self, block_number: u64, block_hash: Hash48, already_exists: bool) {
        debug!(block_number, root = %short_hex(&block_hash), "[bs-02] Sending block acknowledgement");
        self.publish(PublishStreamResponse::ack(block_number, block_hash, already_exists));
    }

    fn send_end_of_stream(&self, block_number: u64, code: PublishStreamResponseCode) {
        debug!(block_number, ?code, "[bs-02] Sending end of stream");
        self.publish(PublishStreamResponse::end_of_stream(block_number, code));
    }
}
