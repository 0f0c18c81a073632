//! In-process queue used by tests and local runs. Records every published
//! payload and can be flipped into a failing mode to exercise the
//! publisher-error path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::{Consumer, ConsumerChannel, Delivery, Publisher};

pub struct MemoryQueue {
	tx: mpsc::UnboundedSender<Vec<u8>>,
	rx: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
	published: Mutex<Vec<Vec<u8>>>,
	failing: AtomicBool,
}

impl Default for MemoryQueue {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryQueue {
	pub fn new() -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		Self {
			tx,
			rx: Mutex::new(Some(rx)),
			published: Mutex::new(Vec::new()),
			failing: AtomicBool::new(false),
		}
	}

	/// Makes every subsequent publish report failure.
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	/// Every payload successfully published so far.
	pub async fn published(&self) -> Vec<Vec<u8>> {
		self.published.lock().await.clone()
	}
}

#[async_trait]
impl Publisher for MemoryQueue {
	async fn publish(&self, payload: Vec<u8>) -> bool {
		if self.failing.load(Ordering::SeqCst) {
			return false;
		}
		self.published.lock().await.push(payload.clone());
		self.tx.send(payload).is_ok()
	}
}

impl ConsumerChannel for MemoryQueue {
	fn start_consuming(&self, consumer: Arc<dyn Consumer>) -> JoinHandle<()> {
		let rx = self
			.rx
			.try_lock()
			.ok()
			.and_then(|mut slot| slot.take());
		let requeue_tx = self.tx.clone();
		tokio::spawn(async move {
			let Some(mut rx) = rx else { return };
			while let Some(payload) = rx.recv().await {
				let delivery = MemoryDelivery {
					payload,
					requeue_tx: requeue_tx.clone(),
				};
				consumer.consume(Box::new(delivery)).await;
			}
		})
	}
}

struct MemoryDelivery {
	payload: Vec<u8>,
	requeue_tx: mpsc::UnboundedSender<Vec<u8>>,
}

#[async_trait]
impl Delivery for MemoryDelivery {
	fn payload(&self) -> &[u8] {
		&self.payload
	}

	async fn ack(self: Box<Self>) {}

	async fn requeue(self: Box<Self>) {
		let _ = self.requeue_tx.send(self.payload);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tokio::sync::mpsc::UnboundedSender;

	struct Collector {
		tx: UnboundedSender<Vec<u8>>,
	}

	#[async_trait]
	impl Consumer for Collector {
		async fn consume(&self, delivery: Box<dyn Delivery>) {
			let _ = self.tx.send(delivery.payload().to_vec());
			delivery.ack().await;
		}
	}

	#[tokio::test]
	async fn publish_reaches_consumer() {
		let queue = MemoryQueue::new();
		let (tx, mut rx) = mpsc::unbounded_channel();
		queue.start_consuming(Arc::new(Collector { tx }));
		assert!(queue.publish(b"payload".to_vec()).await);
		assert_eq!(rx.recv().await.unwrap(), b"payload");
		assert_eq!(queue.published().await, vec![b"payload".to_vec()]);
	}

	#[tokio::test]
	async fn failing_mode_rejects_publishes() {
		let queue = MemoryQueue::new();
		queue.set_failing(true);
		assert!(!queue.publish(b"payload".to_vec()).await);
		assert!(queue.published().await.is_empty());
	}
}
