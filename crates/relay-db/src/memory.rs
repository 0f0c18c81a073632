//! In-memory store implementations, mirroring the Postgres semantics for
//! tests and local runs.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{oneshot, RwLock};

use relay_types::{Address, AssetData, OrderRecord, B256};

use crate::asset_pair::{AssetPairRecord, AssetPairStore};
use crate::exchange::ExchangeLookup;
use crate::order::{OrderFilter, OrderStore};
use crate::DbError;

/// Static exchange→network map.
#[derive(Default)]
pub struct MemoryExchangeLookup {
	networks: DashMap<Address, u64>,
}

impl MemoryExchangeLookup {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, address: Address, network: u64) {
		self.networks.insert(address, network);
	}
}

impl ExchangeLookup for MemoryExchangeLookup {
	fn exchange_is_known(&self, address: &Address) -> oneshot::Receiver<u64> {
		let (tx, rx) = oneshot::channel();
		let network = self.networks.get(address).map(|hit| *hit).unwrap_or(0);
		let _ = tx.send(network);
		rx
	}
}

/// Order store over a plain vector, ordered and filtered like the SQL
/// implementation.
#[derive(Default)]
pub struct MemoryOrderStore {
	records: RwLock<Vec<OrderRecord>>,
	failing: AtomicBool,
}

impl MemoryOrderStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn insert(&self, record: OrderRecord) {
		self.records.write().await.push(record);
	}

	/// Makes `ping` fail, for exercising the health endpoint.
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}
}

fn demanded_rate(record: &OrderRecord) -> f64 {
	let maker: f64 = record
		.order
		.maker_asset_amount
		.to_string()
		.parse()
		.unwrap_or(f64::MAX);
	let taker: f64 = record
		.order
		.taker_asset_amount
		.to_string()
		.parse()
		.unwrap_or(f64::MAX);
	if maker == 0.0 {
		f64::MAX
	} else {
		taker / maker
	}
}

fn paginate<T: Clone>(items: &[T], page: u64, per_page: u64) -> Vec<T> {
	let start = page.saturating_sub(1).saturating_mul(per_page) as usize;
	items
		.iter()
		.skip(start)
		.take(per_page as usize)
		.cloned()
		.collect()
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
	async fn find_by_hash(&self, hash: &B256) -> Result<Option<OrderRecord>, DbError> {
		let wanted = format!("{hash:#x}");
		Ok(self
			.records
			.read()
			.await
			.iter()
			.find(|record| record.metadata.hash == wanted)
			.cloned())
	}

	async fn search(
		&self,
		filter: &OrderFilter,
		page: u64,
		per_page: u64,
	) -> Result<(Vec<OrderRecord>, u64), DbError> {
		let mut matched: Vec<OrderRecord> = self
			.records
			.read()
			.await
			.iter()
			.filter(|record| filter.matches(record))
			.cloned()
			.collect();
		matched.sort_by(|a, b| {
			demanded_rate(a)
				.total_cmp(&demanded_rate(b))
				.then_with(|| a.metadata.hash.cmp(&b.metadata.hash))
		});
		let total = matched.len() as u64;
		Ok((paginate(&matched, page, per_page), total))
	}

	async fn ping(&self) -> Result<(), DbError> {
		if self.failing.load(Ordering::SeqCst) {
			return Err(DbError::CorruptRow("store offline".to_string()));
		}
		Ok(())
	}
}

/// Asset pairs over a plain vector, keyed by network.
#[derive(Default)]
pub struct MemoryAssetPairStore {
	pairs: RwLock<Vec<(u64, AssetPairRecord)>>,
}

impl MemoryAssetPairStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn insert(&self, network_id: u64, pair: AssetPairRecord) {
		self.pairs.write().await.push((network_id, pair));
	}

	async fn select(
		&self,
		network_id: u64,
		keep: impl Fn(&AssetPairRecord) -> bool,
	) -> Vec<AssetPairRecord> {
		self.pairs
			.read()
			.await
			.iter()
			.filter(|(network, pair)| *network == network_id && keep(pair))
			.map(|(_, pair)| pair.clone())
			.collect()
	}
}

#[async_trait]
impl AssetPairStore for MemoryAssetPairStore {
	async fn all(
		&self,
		network_id: u64,
		page: u64,
		per_page: u64,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError> {
		let matched = self.select(network_id, |_| true).await;
		let total = matched.len() as u64;
		Ok((paginate(&matched, page, per_page), total))
	}

	async fn by_asset_data(
		&self,
		data: &AssetData,
		network_id: u64,
		page: u64,
		per_page: u64,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError> {
		let matched = self
			.select(network_id, |pair| {
				pair.asset_a.data == *data || pair.asset_b.data == *data
			})
			.await;
		let total = matched.len() as u64;
		Ok((paginate(&matched, page, per_page), total))
	}

	async fn by_asset_pair(
		&self,
		data_a: &AssetData,
		data_b: &AssetData,
		network_id: u64,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError> {
		let matched = self
			.select(network_id, |pair| {
				(pair.asset_a.data == *data_a && pair.asset_b.data == *data_b)
					|| (pair.asset_a.data == *data_b && pair.asset_b.data == *data_a)
			})
			.await;
		let total = matched.len() as u64;
		Ok((matched, total))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use relay_types::{Order, OrderMetadata, U256};

	fn record(hash_byte: u8, maker: Address, maker_amount: u64, taker_amount: u64) -> OrderRecord {
		let order = Order {
			maker_address: maker,
			maker_asset_amount: U256::from(maker_amount),
			taker_asset_amount: U256::from(taker_amount),
			..Order::default()
		};
		OrderRecord {
			order,
			metadata: OrderMetadata {
				hash: format!("{:#x}", B256::repeat_byte(hash_byte)),
				fee_rate: 0.0,
				status: crate::STATUS_OPEN,
				taker_asset_amount_remaining: taker_amount.to_string(),
			},
		}
	}

	#[tokio::test]
	async fn search_filters_and_orders_by_demanded_rate() {
		let store = MemoryOrderStore::new();
		let maker = Address::with_last_byte(1);
		store.insert(record(1, maker, 100, 300)).await; // rate 3
		store.insert(record(2, maker, 100, 100)).await; // rate 1
		store.insert(record(3, Address::with_last_byte(2), 100, 200)).await;

		let filter = OrderFilter {
			maker_address: Some(maker),
			..OrderFilter::default()
		};
		let (records, total) = store.search(&filter, 1, 20).await.unwrap();
		assert_eq!(total, 2);
		let hashes: Vec<_> = records.iter().map(|r| r.metadata.hash.clone()).collect();
		assert_eq!(
			hashes,
			vec![
				format!("{:#x}", B256::repeat_byte(2)),
				format!("{:#x}", B256::repeat_byte(1)),
			]
		);
	}

	#[tokio::test]
	async fn search_paginates() {
		let store = MemoryOrderStore::new();
		for byte in 1..=5u8 {
			store
				.insert(record(byte, Address::with_last_byte(1), 100, byte as u64 * 100))
				.await;
		}
		let (records, total) = store.search(&OrderFilter::default(), 2, 2).await.unwrap();
		assert_eq!(total, 5);
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].metadata.hash, format!("{:#x}", B256::repeat_byte(3)));
	}

	#[tokio::test]
	async fn find_by_hash() {
		let store = MemoryOrderStore::new();
		store.insert(record(7, Address::with_last_byte(1), 1, 1)).await;
		assert!(store
			.find_by_hash(&B256::repeat_byte(7))
			.await
			.unwrap()
			.is_some());
		assert!(store
			.find_by_hash(&B256::repeat_byte(8))
			.await
			.unwrap()
			.is_none());
	}
}
