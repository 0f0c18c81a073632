//! Most recently observed block hash, fed from the block-header queue.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::{Consumer, ConsumerChannel, Delivery};

/// Read handle on the latest block hash. Cheap to clone; all clones follow
/// the same feed.
#[derive(Clone)]
pub struct BlockHash {
	rx: watch::Receiver<String>,
}

impl BlockHash {
	/// Subscribes a consumer to the given block-header channel and returns
	/// the read handle.
	pub fn channeled(channel: &dyn ConsumerChannel) -> Self {
		let (tx, rx) = watch::channel(String::new());
		channel.start_consuming(Arc::new(BlockHashConsumer { tx }));
		Self { rx }
	}

	/// The latest hash with any surrounding JSON quotes trimmed. Empty
	/// until the first header arrives, which the health check treats as
	/// unhealthy.
	pub fn get(&self) -> String {
		self.rx.borrow().trim_matches('"').to_string()
	}
}

struct BlockHashConsumer {
	tx: watch::Sender<String>,
}

#[async_trait]
impl Consumer for BlockHashConsumer {
	async fn consume(&self, delivery: Box<dyn Delivery>) {
		let hash = String::from_utf8_lossy(delivery.payload()).to_string();
		debug!(%hash, "block hash updated");
		let _ = self.tx.send(hash);
		delivery.ack().await;
	}
}
