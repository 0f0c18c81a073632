//! Resolution of tenant names to pool records. The pool id is always the
//! keccak-256 of the tenant name; the empty name is the default pool.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use relay_storage::BaseFee;
use relay_types::{keccak256, B256};

use crate::{Pool, PoolError};

/// Derives a pool id from its tenant name.
pub fn pool_id(name: &str) -> B256 {
	keccak256(name.as_bytes())
}

/// Backing store of pool records, keyed by derived id.
#[async_trait]
pub trait PoolStore: Send + Sync {
	async fn find(&self, id: &B256) -> Result<Option<Pool>, PoolError>;
}

/// Name-based pool resolution with the default-pool fallback.
#[derive(Clone)]
pub struct PoolRegistry {
	store: Arc<dyn PoolStore>,
}

impl PoolRegistry {
	pub fn new(store: Arc<dyn PoolStore>) -> Self {
		Self { store }
	}

	/// Resolves a tenant name. A missing row is an error for named pools
	/// and the all-permissive default for the empty name.
	pub async fn resolve(&self, name: &str) -> Result<Pool, PoolError> {
		let id = pool_id(name);
		match self.store.find(&id).await? {
			Some(pool) => Ok(pool),
			None if name.is_empty() => {
				debug!("no default pool row, using the empty pool");
				Ok(Pool::default())
			}
			None => Err(PoolError::NotFound(format!("no pool named {name:?}"))),
		}
	}

	/// Same as [`resolve`](Self::resolve) with the base-fee handle attached
	/// for the fee-charging endpoints.
	pub async fn resolve_with_base_fee(
		&self,
		name: &str,
		base_fee: BaseFee,
	) -> Result<Pool, PoolError> {
		let mut pool = self.resolve(name).await?;
		pool.set_base_fee(base_fee);
		Ok(pool)
	}
}

/// In-memory pool store for tests and local runs.
#[derive(Default)]
pub struct MemoryPoolStore {
	pools: RwLock<HashMap<B256, Pool>>,
}

impl MemoryPoolStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn insert(&self, name: &str, mut pool: Pool) {
		pool.id = pool_id(name);
		self.pools.write().await.insert(pool.id, pool);
	}
}

#[async_trait]
impl PoolStore for MemoryPoolStore {
	async fn find(&self, id: &B256) -> Result<Option<Pool>, PoolError> {
		Ok(self.pools.read().await.get(id).cloned())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn id_is_keccak_of_the_name() {
		// keccak256("") is the well-known empty digest.
		assert_eq!(
			format!("{:x}", pool_id("")),
			"c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
		);
		assert_ne!(pool_id("alpha"), pool_id("beta"));
		assert_eq!(Pool::default().id, pool_id(""));
	}

	#[tokio::test]
	async fn unknown_named_pool_is_an_error() {
		let registry = PoolRegistry::new(Arc::new(MemoryPoolStore::new()));
		assert!(matches!(
			registry.resolve("missing").await,
			Err(PoolError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn missing_default_pool_degrades_to_empty_pool() {
		let registry = PoolRegistry::new(Arc::new(MemoryPoolStore::new()));
		let pool = registry.resolve("").await.unwrap();
		assert_eq!(pool, Pool::default());
	}

	#[tokio::test]
	async fn named_pool_resolves_with_derived_id() {
		let store = Arc::new(MemoryPoolStore::new());
		store
			.insert(
				"vip",
				Pool {
					expiration: 99,
					..Pool::default()
				},
			)
			.await;
		let registry = PoolRegistry::new(store);
		let pool = registry.resolve("vip").await.unwrap();
		assert_eq!(pool.id, pool_id("vip"));
		assert_eq!(pool.expiration, 99);
	}
}
