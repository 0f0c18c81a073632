//! Relational state behind the query surface: orders, asset pairs,
//! exchange deployments and pool rows. Store traits live here next to
//! their Postgres and in-memory implementations.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use thiserror::Error;

pub mod asset_pair;
pub mod exchange;
pub mod memory;
pub mod order;
pub mod pool_store;

pub use asset_pair::{AssetPairRecord, AssetPairStore, AssetRecord, PgAssetPairStore};
pub use exchange::{ExchangeLookup, PgExchangeLookup};
pub use memory::{MemoryAssetPairStore, MemoryExchangeLookup, MemoryOrderStore};
pub use order::{OrderFilter, OrderStore, PgOrderStore};
pub use pool_store::PgPoolStore;

/// Order status values persisted by the fill pipeline.
pub const STATUS_OPEN: i64 = 0;
pub const STATUS_FILLED: i64 = 1;
pub const STATUS_CANCELLED: i64 = 2;
pub const STATUS_UNFUNDED: i64 = 3;

#[derive(Debug, Error)]
pub enum DbError {
	#[error(transparent)]
	Backend(#[from] sqlx::Error),
	#[error("malformed value for {field}: {detail}")]
	BadFilterValue { field: String, detail: String },
	#[error("corrupt row: {0}")]
	CorruptRow(String),
}

impl DbError {
	pub fn bad_filter(field: impl Into<String>, detail: impl Into<String>) -> Self {
		Self::BadFilterValue {
			field: field.into(),
			detail: detail.into(),
		}
	}
}

/// Connects to Postgres, applying the separately supplied password over
/// the connection URL.
pub async fn connect(url: &str, password: &str) -> Result<PgPool, DbError> {
	let mut options = PgConnectOptions::from_str(url)?;
	if !password.is_empty() {
		options = options.password(password);
	}
	let pool = PgPoolOptions::new()
		.max_connections(10)
		.connect_with(options)
		.await?;
	Ok(pool)
}
