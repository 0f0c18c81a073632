//! Tradeable asset pairs. Pairs reference assets by symbol; assets carry
//! their proxy-tagged data and trade limits, and belong to a network
//! through their proxy's exchange deployment.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{QueryBuilder, Row};

use relay_types::{AssetData, U256};

use crate::DbError;

/// One side of a tradeable pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
	pub data: AssetData,
	pub min_trade_amount: U256,
	pub max_trade_amount: U256,
	pub precision: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPairRecord {
	pub asset_a: AssetRecord,
	pub asset_b: AssetRecord,
}

/// Query access to the tradeable pairs of a network.
#[async_trait]
pub trait AssetPairStore: Send + Sync {
	/// All pairs on a network, paginated.
	async fn all(
		&self,
		network_id: u64,
		page: u64,
		per_page: u64,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError>;

	/// Pairs including the given asset on either side.
	async fn by_asset_data(
		&self,
		data: &AssetData,
		network_id: u64,
		page: u64,
		per_page: u64,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError>;

	/// The pair trading exactly these two assets, in either orientation.
	async fn by_asset_pair(
		&self,
		data_a: &AssetData,
		data_b: &AssetData,
		network_id: u64,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError>;
}

const PAIR_COLUMNS: &str = "asset_a.data AS data_a, asset_a.min_trade_amount AS min_a, \
	asset_a.max_trade_amount AS max_a, asset_a.precision AS precision_a, \
	asset_b.data AS data_b, asset_b.min_trade_amount AS min_b, \
	asset_b.max_trade_amount AS max_b, asset_b.precision AS precision_b";

const PAIR_JOINS: &str = " FROM asset_pairs \
	JOIN assets AS asset_a ON asset_a.symbol = asset_pairs.asset_symbol_a \
	JOIN assets AS asset_b ON asset_b.symbol = asset_pairs.asset_symbol_b \
	JOIN asset_proxies AS proxy_a ON proxy_a.id = asset_a.proxy_id \
	JOIN asset_proxies AS proxy_b ON proxy_b.id = asset_b.proxy_id \
	JOIN exchanges AS exchange_a ON exchange_a.address = proxy_a.exchange_address \
	JOIN exchanges AS exchange_b ON exchange_b.address = proxy_b.exchange_address";

#[derive(Clone)]
pub struct PgAssetPairStore {
	pool: PgPool,
}

impl PgAssetPairStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	async fn run(
		&self,
		network_id: u64,
		extra: impl Fn(&mut QueryBuilder<'_, sqlx::Postgres>),
		limit: Option<(u64, u64)>,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError> {
		let mut count_query = QueryBuilder::new("SELECT COUNT(*)");
		count_query.push(PAIR_JOINS);
		push_network(&mut count_query, network_id);
		extra(&mut count_query);
		let total: i64 = count_query
			.build_query_scalar()
			.fetch_one(&self.pool)
			.await?;
		if total == 0 {
			return Ok((Vec::new(), 0));
		}

		let mut query = QueryBuilder::new(format!("SELECT {PAIR_COLUMNS}"));
		query.push(PAIR_JOINS);
		push_network(&mut query, network_id);
		extra(&mut query);
		query.push(" ORDER BY asset_pairs.asset_symbol_a, asset_pairs.asset_symbol_b");
		if let Some((page, per_page)) = limit {
			let offset = page.saturating_sub(1).saturating_mul(per_page);
			query.push(" LIMIT ");
			query.push_bind(per_page.min(i64::MAX as u64) as i64);
			query.push(" OFFSET ");
			query.push_bind(offset.min(i64::MAX as u64) as i64);
		}
		let rows = query.build().fetch_all(&self.pool).await?;
		let records = rows
			.iter()
			.map(pair_from_row)
			.collect::<Result<Vec<_>, _>>()?;
		Ok((records, total as u64))
	}
}

fn push_network(query: &mut QueryBuilder<'_, sqlx::Postgres>, network_id: u64) {
	query.push(" WHERE exchange_a.network = ");
	query.push_bind(network_id.min(i64::MAX as u64) as i64);
	query.push(" AND exchange_b.network = ");
	query.push_bind(network_id.min(i64::MAX as u64) as i64);
}

#[async_trait]
impl AssetPairStore for PgAssetPairStore {
	async fn all(
		&self,
		network_id: u64,
		page: u64,
		per_page: u64,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError> {
		self.run(
			network_id,
			|_: &mut QueryBuilder<'_, sqlx::Postgres>| {},
			Some((page, per_page)),
		)
		.await
	}

	async fn by_asset_data(
		&self,
		data: &AssetData,
		network_id: u64,
		page: u64,
		per_page: u64,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError> {
		let bytes = data.as_bytes().to_vec();
		self.run(
			network_id,
			move |query: &mut QueryBuilder<'_, sqlx::Postgres>| {
				query.push(" AND (asset_a.data = ");
				query.push_bind(bytes.clone());
				query.push(" OR asset_b.data = ");
				query.push_bind(bytes.clone());
				query.push(")");
			},
			Some((page, per_page)),
		)
		.await
	}

	async fn by_asset_pair(
		&self,
		data_a: &AssetData,
		data_b: &AssetData,
		network_id: u64,
	) -> Result<(Vec<AssetPairRecord>, u64), DbError> {
		let bytes_a = data_a.as_bytes().to_vec();
		let bytes_b = data_b.as_bytes().to_vec();
		self.run(
			network_id,
			move |query: &mut QueryBuilder<'_, sqlx::Postgres>| {
				query.push(" AND ((asset_a.data = ");
				query.push_bind(bytes_a.clone());
				query.push(" AND asset_b.data = ");
				query.push_bind(bytes_b.clone());
				query.push(") OR (asset_a.data = ");
				query.push_bind(bytes_b.clone());
				query.push(" AND asset_b.data = ");
				query.push_bind(bytes_a.clone());
				query.push("))");
			},
			None,
		)
		.await
	}
}

fn pair_from_row(row: &PgRow) -> Result<AssetPairRecord, DbError> {
	Ok(AssetPairRecord {
		asset_a: asset_from_row(row, "data_a", "min_a", "max_a", "precision_a")?,
		asset_b: asset_from_row(row, "data_b", "min_b", "max_b", "precision_b")?,
	})
}

fn asset_from_row(
	row: &PgRow,
	data: &str,
	min: &str,
	max: &str,
	precision: &str,
) -> Result<AssetRecord, DbError> {
	let amount = |column: &str| -> Result<U256, DbError> {
		let raw: Vec<u8> = row.try_get(column)?;
		if raw.len() > 32 {
			return Err(DbError::CorruptRow(format!(
				"{column} holds {} bytes, want at most 32",
				raw.len()
			)));
		}
		Ok(U256::from_be_slice(&raw))
	};
	Ok(AssetRecord {
		data: AssetData::from(row.try_get::<Vec<u8>, _>(data)?),
		min_trade_amount: amount(min)?,
		max_trade_amount: amount(max)?,
		precision: row.try_get::<i16, _>(precision)? as u8,
	})
}
