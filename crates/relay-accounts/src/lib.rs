//! Maker-account and fee-recipient oracles, both backed by the shared
//! key-value store.

use std::sync::Arc;

use relay_types::{Address, U256};
use relay_storage::{KvStore, StorageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const ACCOUNT_PREFIX: &str = "account::";
const AFFILIATE_PREFIX: &str = "affiliate::";

/// Per-maker record. Unknown makers resolve to the default account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
	#[serde(with = "relay_types::u256_decimal", default)]
	discount: U256,
	#[serde(default)]
	blacklisted: bool,
}

impl Account {
	pub fn new(discount: U256, blacklisted: bool) -> Self {
		Self {
			discount,
			blacklisted,
		}
	}

	/// Amount subtracted from the pool fee when computing this maker's
	/// minimum total fee.
	pub fn discount(&self) -> U256 {
		self.discount
	}

	pub fn blacklisted(&self) -> bool {
		self.blacklisted
	}
}

/// Fee-recipient record. Presence is the authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliate {
	pub address: Address,
}

#[derive(Debug, Error)]
pub enum AffiliateError {
	#[error("unknown affiliate")]
	NotFound,
	#[error(transparent)]
	Storage(#[from] StorageError),
}

fn account_key(address: &Address) -> String {
	format!("{ACCOUNT_PREFIX}{address:#x}")
}

fn affiliate_key(address: &Address) -> String {
	format!("{AFFILIATE_PREFIX}{address:#x}")
}

/// Lookup of maker records. Misses and corrupt records degrade to the
/// default account so a store hiccup never blocks ingestion outright.
#[derive(Clone)]
pub struct AccountService {
	store: Arc<dyn KvStore>,
}

impl AccountService {
	pub fn new(store: Arc<dyn KvStore>) -> Self {
		Self { store }
	}

	pub async fn get(&self, address: &Address) -> Account {
		match self.store.get(&account_key(address)).await {
			Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|err| {
				warn!(maker = %address, %err, "corrupt account record, using default");
				Account::default()
			}),
			Err(StorageError::NotFound) => Account::default(),
			Err(err) => {
				warn!(maker = %address, %err, "account lookup failed, using default");
				Account::default()
			}
		}
	}

	pub async fn set(&self, address: &Address, account: &Account) -> Result<(), StorageError> {
		let raw = serde_json::to_vec(account)
			.map_err(|err| StorageError::Backend(err.to_string()))?;
		self.store.set(&account_key(address), raw).await
	}
}

/// Lookup of authorized fee recipients. Absence is a hard failure for the
/// caller: orders naming an unregistered recipient are rejected.
#[derive(Clone)]
pub struct AffiliateService {
	store: Arc<dyn KvStore>,
}

impl AffiliateService {
	pub fn new(store: Arc<dyn KvStore>) -> Self {
		Self { store }
	}

	pub async fn get(&self, address: &Address) -> Result<Affiliate, AffiliateError> {
		match self.store.exists(&affiliate_key(address)).await? {
			true => Ok(Affiliate { address: *address }),
			false => Err(AffiliateError::NotFound),
		}
	}

	/// All registered recipients, sorted for stable pagination.
	pub async fn list(&self) -> Result<Vec<Address>, AffiliateError> {
		let mut addresses: Vec<Address> = self
			.store
			.keys(AFFILIATE_PREFIX)
			.await?
			.into_iter()
			.filter_map(|key| key[AFFILIATE_PREFIX.len()..].parse().ok())
			.collect();
		addresses.sort();
		Ok(addresses)
	}

	pub async fn set(&self, address: &Address) -> Result<(), AffiliateError> {
		self.store
			.set(&affiliate_key(address), Vec::new())
			.await
			.map_err(AffiliateError::from)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use relay_storage::MemoryKv;

	fn store() -> Arc<dyn KvStore> {
		Arc::new(MemoryKv::new())
	}

	#[tokio::test]
	async fn unknown_maker_gets_default_account() {
		let accounts = AccountService::new(store());
		let account = accounts.get(&Address::with_last_byte(1)).await;
		assert_eq!(account.discount(), U256::ZERO);
		assert!(!account.blacklisted());
	}

	#[tokio::test]
	async fn account_roundtrip() {
		let accounts = AccountService::new(store());
		let maker = Address::with_last_byte(2);
		let record = Account::new(U256::from(200_000_000_000_000_000u128), true);
		accounts.set(&maker, &record).await.unwrap();
		assert_eq!(accounts.get(&maker).await, record);
	}

	#[tokio::test]
	async fn corrupt_account_degrades_to_default() {
		let kv = store();
		let maker = Address::with_last_byte(3);
		kv.set(&format!("account::{maker:#x}"), b"garbage".to_vec())
			.await
			.unwrap();
		let accounts = AccountService::new(kv);
		assert_eq!(accounts.get(&maker).await, Account::default());
	}

	#[tokio::test]
	async fn affiliate_presence_and_absence() {
		let affiliates = AffiliateService::new(store());
		let recipient = Address::with_last_byte(4);
		assert!(matches!(
			affiliates.get(&recipient).await,
			Err(AffiliateError::NotFound)
		));
		affiliates.set(&recipient).await.unwrap();
		assert_eq!(affiliates.get(&recipient).await.unwrap().address, recipient);
	}

	#[tokio::test]
	async fn list_is_sorted() {
		let affiliates = AffiliateService::new(store());
		for byte in [9u8, 1, 5] {
			affiliates.set(&Address::with_last_byte(byte)).await.unwrap();
		}
		let listed = affiliates.list().await.unwrap();
		assert_eq!(
			listed,
			vec![
				Address::with_last_byte(1),
				Address::with_last_byte(5),
				Address::with_last_byte(9),
			]
		);
	}
}
