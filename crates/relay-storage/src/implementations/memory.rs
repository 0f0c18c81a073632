//! In-memory key-value store for tests and local runs.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{KvStore, StorageError};

#[derive(Default)]
pub struct MemoryKv {
	entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKv {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl KvStore for MemoryKv {
	async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.entries
			.read()
			.await
			.get(key)
			.cloned()
			.ok_or(StorageError::NotFound)
	}

	async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		self.entries.write().await.insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		self.entries.write().await.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.entries.read().await.contains_key(key))
	}

	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		Ok(self
			.entries
			.read()
			.await
			.keys()
			.filter(|key| key.starts_with(prefix))
			.cloned()
			.collect())
	}

	async fn server_time(&self) -> Result<Vec<String>, StorageError> {
		let now = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_err(|err| StorageError::Backend(err.to_string()))?;
		Ok(vec![
			now.as_secs().to_string(),
			now.subsec_micros().to_string(),
		])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn set_get_delete() {
		let store = MemoryKv::new();
		store.set("a", b"1".to_vec()).await.unwrap();
		assert_eq!(store.get("a").await.unwrap(), b"1");
		assert!(store.exists("a").await.unwrap());
		store.delete("a").await.unwrap();
		assert!(matches!(store.get("a").await, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn keys_filters_by_prefix() {
		let store = MemoryKv::new();
		store.set("affiliate::0x01", vec![]).await.unwrap();
		store.set("affiliate::0x02", vec![]).await.unwrap();
		store.set("account::0x01", vec![]).await.unwrap();
		let mut keys = store.keys("affiliate::").await.unwrap();
		keys.sort();
		assert_eq!(keys, vec!["affiliate::0x01", "affiliate::0x02"]);
	}
}
