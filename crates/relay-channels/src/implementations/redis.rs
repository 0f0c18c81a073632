//! Redis list-backed queues. Published payloads are pushed onto a list;
//! consumers move entries to an unacked sibling list until acknowledged, so
//! a crashed consumer never loses a message silently.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::{ChannelError, Consumer, ConsumerChannel, Delivery, Publisher};

const QUEUE_SCHEME: &str = "queue://";
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// One named queue on a shared Redis connection.
#[derive(Clone)]
pub struct RedisQueue {
	conn: ConnectionManager,
	queue: String,
	unacked: String,
}

impl RedisQueue {
	/// Parses a `queue://<name>` URI against an existing connection.
	pub fn from_uri(uri: &str, conn: ConnectionManager) -> Result<Self, ChannelError> {
		let name = parse_queue_name(uri)?;
		Ok(Self {
			conn,
			queue: name.to_string(),
			unacked: format!("{name}::unacked"),
		})
	}

	pub fn name(&self) -> &str {
		&self.queue
	}
}

#[async_trait]
impl Publisher for RedisQueue {
	async fn publish(&self, payload: Vec<u8>) -> bool {
		let mut conn = self.conn.clone();
		match conn.lpush::<_, _, ()>(&self.queue, payload).await {
			Ok(()) => true,
			Err(err) => {
				error!(queue = %self.queue, %err, "publish failed");
				false
			}
		}
	}
}

impl ConsumerChannel for RedisQueue {
	fn start_consuming(&self, consumer: Arc<dyn Consumer>) -> JoinHandle<()> {
		let channel = self.clone();
		tokio::spawn(async move {
			loop {
				let mut conn = channel.conn.clone();
				let popped: Result<Option<Vec<u8>>, _> = conn
					.rpoplpush(&channel.queue, &channel.unacked)
					.await;
				match popped {
					Ok(Some(payload)) => {
						let delivery = RedisDelivery {
							conn: channel.conn.clone(),
							queue: channel.queue.clone(),
							unacked: channel.unacked.clone(),
							payload,
						};
						consumer.consume(Box::new(delivery)).await;
					}
					Ok(None) => tokio::time::sleep(POLL_INTERVAL).await,
					Err(err) => {
						warn!(queue = %channel.queue, %err, "queue poll failed");
						tokio::time::sleep(POLL_INTERVAL).await;
					}
				}
			}
		})
	}
}

struct RedisDelivery {
	conn: ConnectionManager,
	queue: String,
	unacked: String,
	payload: Vec<u8>,
}

#[async_trait]
impl Delivery for RedisDelivery {
	fn payload(&self) -> &[u8] {
		&self.payload
	}

	async fn ack(self: Box<Self>) {
		let mut conn = self.conn.clone();
		if let Err(err) = conn
			.lrem::<_, _, ()>(&self.unacked, -1, &self.payload)
			.await
		{
			warn!(queue = %self.queue, %err, "ack failed");
		}
	}

	async fn requeue(self: Box<Self>) {
		let mut conn = self.conn.clone();
		if let Err(err) = conn
			.lrem::<_, _, ()>(&self.unacked, -1, &self.payload)
			.await
		{
			warn!(queue = %self.queue, %err, "requeue cleanup failed");
		}
		if let Err(err) = conn.lpush::<_, _, ()>(&self.queue, &self.payload).await {
			warn!(queue = %self.queue, %err, "requeue push failed");
		}
	}
}

fn parse_queue_name(uri: &str) -> Result<&str, ChannelError> {
	uri.strip_prefix(QUEUE_SCHEME)
		.filter(|name| !name.is_empty())
		.ok_or_else(|| ChannelError::MalformedUri(uri.to_string()))
}
