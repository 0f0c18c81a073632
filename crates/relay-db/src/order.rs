//! The persisted order book: typed query filters over the `orders` table
//! and the store trait the query surface is written against.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{QueryBuilder, Row};

use relay_types::{
	parse_address, Address, AssetData, Order, OrderMetadata, OrderRecord, Signature, B256, U256,
};

use crate::{DbError, STATUS_OPEN};

/// Typed search filter. Built from the pool's prefilter pairs and the
/// caller's query string; unrecognised keys are ignored so pagination and
/// network parameters can share the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
	pub maker_address: Option<Address>,
	pub taker_address: Option<Address>,
	pub sender_address: Option<Address>,
	pub fee_recipient_address: Option<Address>,
	pub exchange_address: Option<Address>,
	/// Matches orders where the address is the maker or the taker.
	pub trader_address: Option<Address>,
	pub maker_asset_data: Option<AssetData>,
	pub taker_asset_data: Option<AssetData>,
	pub maker_asset_address: Option<Address>,
	pub taker_asset_address: Option<Address>,
	pub maker_asset_proxy_id: Option<[u8; 4]>,
	pub taker_asset_proxy_id: Option<[u8; 4]>,
	/// Defaults to open orders when unset.
	pub status: Option<i64>,
	pub pool_id: Option<B256>,
}

impl OrderFilter {
	pub fn from_pairs<'a>(
		pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
	) -> Result<Self, DbError> {
		let mut filter = Self::default();
		filter.apply_pairs(pairs)?;
		Ok(filter)
	}

	/// Folds query pairs into the filter, later pairs overriding earlier
	/// ones. Malformed values are errors; unknown keys are not.
	pub fn apply_pairs<'a>(
		&mut self,
		pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
	) -> Result<(), DbError> {
		for (key, value) in pairs {
			match key {
				"makerAddress" => self.maker_address = Some(address_value(key, value)?),
				"takerAddress" => self.taker_address = Some(address_value(key, value)?),
				"senderAddress" => self.sender_address = Some(address_value(key, value)?),
				"feeRecipientAddress" => {
					self.fee_recipient_address = Some(address_value(key, value)?)
				}
				"exchangeAddress" => self.exchange_address = Some(address_value(key, value)?),
				"traderAddress" => self.trader_address = Some(address_value(key, value)?),
				"makerAssetData" => self.maker_asset_data = Some(asset_data_value(key, value)?),
				"takerAssetData" => self.taker_asset_data = Some(asset_data_value(key, value)?),
				"makerAssetAddress" => self.maker_asset_address = Some(address_value(key, value)?),
				"takerAssetAddress" => self.taker_asset_address = Some(address_value(key, value)?),
				"makerAssetProxyId" => self.maker_asset_proxy_id = Some(proxy_value(key, value)?),
				"takerAssetProxyId" => self.taker_asset_proxy_id = Some(proxy_value(key, value)?),
				"status" => {
					self.status = Some(value.parse().map_err(|_| {
						DbError::bad_filter(key, format!("{value:?} is not an integer"))
					})?)
				}
				_ => {}
			}
		}
		Ok(())
	}

	/// Whether a record satisfies every set field. This is the reference
	/// semantics the SQL clauses mirror.
	pub fn matches(&self, record: &OrderRecord) -> bool {
		let order = &record.order;
		let checks = [
			self.maker_address.map_or(true, |a| order.maker_address == a),
			self.taker_address.map_or(true, |a| order.taker_address == a),
			self.sender_address.map_or(true, |a| order.sender_address == a),
			self.fee_recipient_address
				.map_or(true, |a| order.fee_recipient_address == a),
			self.exchange_address
				.map_or(true, |a| order.exchange_address == a),
			self.trader_address
				.map_or(true, |a| order.maker_address == a || order.taker_address == a),
			self.maker_asset_data
				.as_ref()
				.map_or(true, |d| order.maker_asset_data == *d),
			self.taker_asset_data
				.as_ref()
				.map_or(true, |d| order.taker_asset_data == *d),
			self.maker_asset_address
				.map_or(true, |a| order.maker_asset_data.token_address() == a),
			self.taker_asset_address
				.map_or(true, |a| order.taker_asset_data.token_address() == a),
			self.maker_asset_proxy_id
				.map_or(true, |p| order.maker_asset_data.proxy_id() == p),
			self.taker_asset_proxy_id
				.map_or(true, |p| order.taker_asset_data.proxy_id() == p),
			record.metadata.status == self.status.unwrap_or(STATUS_OPEN),
			self.pool_id.map_or(true, |p| order.pool_id == p),
		];
		checks.into_iter().all(|ok| ok)
	}
}

fn address_value(field: &str, value: &str) -> Result<Address, DbError> {
	parse_address(value).map_err(|err| DbError::bad_filter(field, err.to_string()))
}

fn asset_data_value(field: &str, value: &str) -> Result<AssetData, DbError> {
	let stripped = value
		.strip_prefix("0x")
		.or_else(|| value.strip_prefix("0X"))
		.unwrap_or(value);
	let bytes = hex::decode(stripped).map_err(|err| DbError::bad_filter(field, err.to_string()))?;
	Ok(AssetData::from(bytes))
}

fn proxy_value(field: &str, value: &str) -> Result<[u8; 4], DbError> {
	let data = asset_data_value(field, value)?;
	if data.as_bytes().len() != 4 {
		return Err(DbError::bad_filter(field, "proxy id must be 4 bytes"));
	}
	Ok(data.proxy_id())
}

/// Query access to persisted orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
	async fn find_by_hash(&self, hash: &B256) -> Result<Option<OrderRecord>, DbError>;

	/// Filtered page of orders plus the unpaginated total, ordered by the
	/// rate the maker demands (ascending, ties broken by hash).
	async fn search(
		&self,
		filter: &OrderFilter,
		page: u64,
		per_page: u64,
	) -> Result<(Vec<OrderRecord>, u64), DbError>;

	/// Connectivity probe for the health check.
	async fn ping(&self) -> Result<(), DbError>;
}

/// `orders` table access.
#[derive(Clone)]
pub struct PgOrderStore {
	pool: PgPool,
}

impl PgOrderStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl OrderStore for PgOrderStore {
	async fn find_by_hash(&self, hash: &B256) -> Result<Option<OrderRecord>, DbError> {
		let row = sqlx::query("SELECT * FROM orders WHERE order_hash = $1")
			.bind(hash.as_slice())
			.fetch_optional(&self.pool)
			.await?;
		row.as_ref().map(record_from_row).transpose()
	}

	async fn search(
		&self,
		filter: &OrderFilter,
		page: u64,
		per_page: u64,
	) -> Result<(Vec<OrderRecord>, u64), DbError> {
		let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM orders");
		push_where(&mut count_query, filter);
		let total: i64 = count_query
			.build_query_scalar()
			.fetch_one(&self.pool)
			.await?;
		if total == 0 {
			return Ok((Vec::new(), 0));
		}

		let offset = page.saturating_sub(1).saturating_mul(per_page);
		let mut query = QueryBuilder::new("SELECT * FROM orders");
		push_where(&mut query, filter);
		query.push(" ORDER BY price ASC, order_hash ASC LIMIT ");
		query.push_bind(per_page.min(i64::MAX as u64) as i64);
		query.push(" OFFSET ");
		query.push_bind(offset.min(i64::MAX as u64) as i64);
		let rows = query.build().fetch_all(&self.pool).await?;
		let records = rows
			.iter()
			.map(record_from_row)
			.collect::<Result<Vec<_>, _>>()?;
		Ok((records, total as u64))
	}

	async fn ping(&self) -> Result<(), DbError> {
		sqlx::query("SELECT 1").execute(&self.pool).await?;
		Ok(())
	}
}

fn push_where(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &OrderFilter) {
	query.push(" WHERE status = ");
	query.push_bind(filter.status.unwrap_or(STATUS_OPEN));
	let address_columns = [
		("maker", filter.maker_address),
		("taker", filter.taker_address),
		("sender", filter.sender_address),
		("fee_recipient", filter.fee_recipient_address),
		("exchange_address", filter.exchange_address),
	];
	for (column, value) in address_columns {
		if let Some(address) = value {
			query.push(format!(" AND {column} = "));
			query.push_bind(address.as_slice().to_vec());
		}
	}
	if let Some(trader) = filter.trader_address {
		query.push(" AND (maker = ");
		query.push_bind(trader.as_slice().to_vec());
		query.push(" OR taker = ");
		query.push_bind(trader.as_slice().to_vec());
		query.push(")");
	}
	let data_columns = [
		("maker_asset_data", &filter.maker_asset_data),
		("taker_asset_data", &filter.taker_asset_data),
	];
	for (column, value) in data_columns {
		if let Some(data) = value {
			query.push(format!(" AND {column} = "));
			query.push_bind(data.as_bytes().to_vec());
		}
	}
	let embedded_addresses = [
		("maker_asset_data", filter.maker_asset_address),
		("taker_asset_data", filter.taker_asset_address),
	];
	for (column, value) in embedded_addresses {
		if let Some(address) = value {
			query.push(format!(" AND substring({column} from 17 for 20) = "));
			query.push_bind(address.as_slice().to_vec());
		}
	}
	let proxies = [
		("maker_asset_data", filter.maker_asset_proxy_id),
		("taker_asset_data", filter.taker_asset_proxy_id),
	];
	for (column, value) in proxies {
		if let Some(proxy) = value {
			query.push(format!(" AND substring({column} from 1 for 4) = "));
			query.push_bind(proxy.to_vec());
		}
	}
	if let Some(pool_id) = filter.pool_id {
		query.push(" AND pool_id = ");
		query.push_bind(pool_id.as_slice().to_vec());
	}
}

fn record_from_row(row: &PgRow) -> Result<OrderRecord, DbError> {
	let order = Order {
		maker_address: address_column(row, "maker")?,
		taker_address: address_column(row, "taker")?,
		sender_address: address_column(row, "sender")?,
		fee_recipient_address: address_column(row, "fee_recipient")?,
		exchange_address: address_column(row, "exchange_address")?,
		maker_fee: u256_column(row, "maker_fee")?,
		taker_fee: u256_column(row, "taker_fee")?,
		maker_asset_amount: u256_column(row, "maker_asset_amount")?,
		taker_asset_amount: u256_column(row, "taker_asset_amount")?,
		maker_asset_data: AssetData::from(bytes_column(row, "maker_asset_data")?),
		taker_asset_data: AssetData::from(bytes_column(row, "taker_asset_data")?),
		salt: u256_column(row, "salt")?,
		expiration_time_seconds: u256_column(row, "expiration_time_seconds")?,
		signature: Signature::from(bytes_column(row, "signature")?),
		pool_id: b256_column(row, "pool_id")?,
	};
	let hash = b256_column(row, "order_hash")?;
	let filled = u256_column(row, "taker_asset_amount_filled")?;
	let remaining = order.taker_asset_amount.saturating_sub(filled);
	Ok(OrderRecord {
		order,
		metadata: OrderMetadata {
			hash: format!("{hash:#x}"),
			fee_rate: row.try_get("fee_rate")?,
			status: row.try_get("status")?,
			taker_asset_amount_remaining: remaining.to_string(),
		},
	})
}

fn bytes_column(row: &PgRow, column: &str) -> Result<Vec<u8>, DbError> {
	Ok(row.try_get::<Vec<u8>, _>(column)?)
}

fn address_column(row: &PgRow, column: &str) -> Result<Address, DbError> {
	let raw = bytes_column(row, column)?;
	if raw.len() != 20 {
		return Err(DbError::CorruptRow(format!(
			"{column} holds {} bytes, want 20",
			raw.len()
		)));
	}
	Ok(Address::from_slice(&raw))
}

fn b256_column(row: &PgRow, column: &str) -> Result<B256, DbError> {
	let raw = bytes_column(row, column)?;
	if raw.len() != 32 {
		return Err(DbError::CorruptRow(format!(
			"{column} holds {} bytes, want 32",
			raw.len()
		)));
	}
	Ok(B256::from_slice(&raw))
}

fn u256_column(row: &PgRow, column: &str) -> Result<U256, DbError> {
	let raw = bytes_column(row, column)?;
	if raw.len() > 32 {
		return Err(DbError::CorruptRow(format!(
			"{column} holds {} bytes, want at most 32",
			raw.len()
		)));
	}
	Ok(U256::from_be_slice(&raw))
}

#[cfg(test)]
mod tests {
	use super::*;
	use relay_types::ERC20_PROXY_ID;

	#[test]
	fn filter_parses_known_keys() {
		let filter = OrderFilter::from_pairs([
			("makerAddress", "0x00000000000000000000000000000000000000aa"),
			("makerAssetProxyId", "0xf47261b0"),
			("status", "1"),
			("page", "3"),
		])
		.unwrap();
		assert_eq!(filter.maker_address, Some(Address::with_last_byte(0xaa)));
		assert_eq!(filter.maker_asset_proxy_id, Some(ERC20_PROXY_ID));
		assert_eq!(filter.status, Some(1));
		assert_eq!(filter.taker_address, None);
	}

	#[test]
	fn filter_rejects_malformed_values() {
		assert!(OrderFilter::from_pairs([("makerAddress", "0xzz")]).is_err());
		assert!(OrderFilter::from_pairs([("makerAssetProxyId", "0xf4")]).is_err());
		assert!(OrderFilter::from_pairs([("status", "open")]).is_err());
	}

	#[test]
	fn later_pairs_override_earlier_ones() {
		let mut filter = OrderFilter::from_pairs([(
			"makerAddress",
			"0x00000000000000000000000000000000000000aa",
		)])
		.unwrap();
		filter
			.apply_pairs([("makerAddress", "0x00000000000000000000000000000000000000bb")])
			.unwrap();
		assert_eq!(filter.maker_address, Some(Address::with_last_byte(0xbb)));
	}
}
