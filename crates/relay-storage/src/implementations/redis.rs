//! Redis-backed key-value store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::{KvStore, StorageError};

/// Key-value store over a shared Redis connection. `ConnectionManager`
/// multiplexes and reconnects, so the handle is cheap to clone.
#[derive(Clone)]
pub struct RedisKv {
	conn: ConnectionManager,
}

impl RedisKv {
	/// Connects to the given Redis address (`host:port` or a full URL).
	pub async fn connect(address: &str) -> Result<Self, StorageError> {
		let url = if address.contains("://") {
			address.to_string()
		} else {
			format!("redis://{address}")
		};
		let client = redis::Client::open(url).map_err(backend)?;
		let conn = ConnectionManager::new(client).await.map_err(backend)?;
		Ok(Self { conn })
	}

	/// The underlying connection, for queues sharing the same server.
	pub fn manager(&self) -> ConnectionManager {
		self.conn.clone()
	}
}

fn backend(err: redis::RedisError) -> StorageError {
	StorageError::Backend(err.to_string())
}

#[async_trait]
impl KvStore for RedisKv {
	async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let mut conn = self.conn.clone();
		let value: Option<Vec<u8>> = conn.get(key).await.map_err(backend)?;
		value.ok_or(StorageError::NotFound)
	}

	async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let mut conn = self.conn.clone();
		conn.set::<_, _, ()>(key, value).await.map_err(backend)
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut conn = self.conn.clone();
		conn.del::<_, ()>(key).await.map_err(backend)
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let mut conn = self.conn.clone();
		conn.exists(key).await.map_err(backend)
	}

	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let mut conn = self.conn.clone();
		let mut found = Vec::new();
		let mut iter: redis::AsyncIter<'_, String> = conn
			.scan_match(format!("{prefix}*"))
			.await
			.map_err(backend)?;
		while let Some(key) = iter.next_item().await {
			found.push(key);
		}
		Ok(found)
	}

	async fn server_time(&self) -> Result<Vec<String>, StorageError> {
		let mut conn = self.conn.clone();
		let (seconds, micros): (u64, u64) = redis::cmd("TIME")
			.query_async(&mut conn)
			.await
			.map_err(backend)?;
		Ok(vec![seconds.to_string(), micros.to_string()])
	}
}
