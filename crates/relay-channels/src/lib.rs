//! Queue plumbing between the relay and its neighbours: a publisher for
//! validated orders and a consumer feed for block headers.

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;

pub mod block_hash;
pub mod implementations {
	pub mod memory;
	pub mod redis;
}

pub use block_hash::BlockHash;
pub use implementations::memory::MemoryQueue;
pub use implementations::redis::RedisQueue;

#[derive(Debug, Error)]
pub enum ChannelError {
	#[error("malformed channel uri: {0}")]
	MalformedUri(String),
	#[error("backend error: {0}")]
	Backend(String),
}

/// Forwards payloads to a downstream queue. Failure is a boolean; retry
/// policy belongs to the caller.
#[async_trait]
pub trait Publisher: Send + Sync {
	async fn publish(&self, payload: Vec<u8>) -> bool;
}

/// One message taken off a queue. Consumed exactly once, by acking or by
/// handing it back.
#[async_trait]
pub trait Delivery: Send {
	fn payload(&self) -> &[u8];
	async fn ack(self: Box<Self>);
	async fn requeue(self: Box<Self>);
}

/// Receives deliveries, one at a time per channel.
#[async_trait]
pub trait Consumer: Send + Sync + 'static {
	async fn consume(&self, delivery: Box<dyn Delivery>);
}

/// A queue that can drive a consumer loop.
pub trait ConsumerChannel {
	/// Spawns the delivery loop for this channel. Deliveries are handed to
	/// the consumer sequentially.
	fn start_consuming(&self, consumer: std::sync::Arc<dyn Consumer>) -> JoinHandle<()>;
}
