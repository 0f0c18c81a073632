//! Shared key-value store abstraction. The account, affiliate and base-fee
//! oracles all read through this interface; the production backend is Redis.

use async_trait::async_trait;
use thiserror::Error;

pub mod base_fee;
pub mod implementations {
	pub mod memory;
	pub mod redis;
}

pub use base_fee::BaseFee;
pub use implementations::memory::MemoryKv;
pub use implementations::redis::RedisKv;

/// Errors that can occur during key-value operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("key not found")]
	NotFound,
	#[error("backend error: {0}")]
	Backend(String),
}

/// Low-level key-value interface shared by every externally stored oracle.
#[async_trait]
pub trait KvStore: Send + Sync {
	/// Retrieves the raw value for a key, `StorageError::NotFound` when absent.
	async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores a raw value under a key.
	async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists all keys starting with the given prefix.
	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	/// The store's current time, used as the liveness probe by the health
	/// check. Redis reports `[seconds, microseconds]`.
	async fn server_time(&self) -> Result<Vec<String>, StorageError>;
}
