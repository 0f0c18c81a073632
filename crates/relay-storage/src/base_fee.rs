//! The process-global base fee, broadcast through the shared store. Read
//! per request; never cached locally.

use std::sync::Arc;

use relay_types::U256;

use crate::{KvStore, StorageError};

const BASE_FEE_KEY: &str = "fees::base";

/// Handle to the broadcast base fee. Cloneable; all clones observe the same
/// store.
#[derive(Clone)]
pub struct BaseFee {
	store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for BaseFee {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BaseFee").finish_non_exhaustive()
	}
}

impl BaseFee {
	pub fn new(store: Arc<dyn KvStore>) -> Self {
		Self { store }
	}

	/// The current base fee in wei. Absence or a corrupt value is an error:
	/// the relay cannot price orders without it.
	pub async fn get(&self) -> Result<U256, StorageError> {
		let raw = self.store.get(BASE_FEE_KEY).await?;
		let text = std::str::from_utf8(&raw)
			.map_err(|err| StorageError::Backend(format!("base fee is not utf-8: {err}")))?;
		U256::from_str_radix(text.trim(), 10)
			.map_err(|err| StorageError::Backend(format!("base fee is not a decimal: {err}")))
	}

	/// Administrative update; ingestion only ever reads.
	pub async fn set(&self, value: U256) -> Result<(), StorageError> {
		self.store
			.set(BASE_FEE_KEY, value.to_string().into_bytes())
			.await
	}
}
