//! Postgres-backed pool rows.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use relay_pool::{Pool, PoolError, PoolStore};
use relay_types::{NetworkAddressMap, B256};

/// `pools` table access. The address maps are stored as JSONB keyed by
/// network id.
#[derive(Clone)]
pub struct PgPoolStore {
	pool: PgPool,
}

impl PgPoolStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl PoolStore for PgPoolStore {
	async fn find(&self, id: &B256) -> Result<Option<Pool>, PoolError> {
		let row = sqlx::query(
			"SELECT id, search_terms, expiration, fee_share, sender_addresses, filter_addresses \
			 FROM pools WHERE id = $1",
		)
		.bind(id.as_slice())
		.fetch_optional(&self.pool)
		.await
		.map_err(|err| PoolError::Store(err.to_string()))?;
		row.map(|row| pool_from_row(&row)).transpose()
	}
}

fn pool_from_row(row: &PgRow) -> Result<Pool, PoolError> {
	let store_err = |err: sqlx::Error| PoolError::Store(err.to_string());
	let id: Vec<u8> = row.try_get("id").map_err(store_err)?;
	if id.len() != 32 {
		return Err(PoolError::Store(format!(
			"pool id holds {} bytes, want 32",
			id.len()
		)));
	}
	let sender_addresses: sqlx::types::Json<NetworkAddressMap> =
		row.try_get("sender_addresses").map_err(store_err)?;
	let filter_addresses: sqlx::types::Json<NetworkAddressMap> =
		row.try_get("filter_addresses").map_err(store_err)?;
	Ok(Pool {
		id: B256::from_slice(&id),
		search_terms: row.try_get("search_terms").map_err(store_err)?,
		expiration: row.try_get::<i64, _>("expiration").map_err(store_err)?.max(0) as u64,
		fee_share: row.try_get("fee_share").map_err(store_err)?,
		sender_addresses: sender_addresses.0,
		filter_addresses: filter_addresses.0,
		..Pool::default()
	})
}
