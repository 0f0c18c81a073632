//! Exchange-contract deployments and the exchange→network oracle. Both
//! cache directions are lazily filled and never invalidated: deployment
//! addresses are immutable for the life of a chain.

use std::sync::Arc;

use dashmap::DashMap;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tokio::sync::oneshot;
use tracing::warn;

use relay_types::Address;

use crate::DbError;

/// The exchange→network oracle consulted during ingestion. The returned
/// handle is the suspension point callers overlap with other work; zero
/// means the exchange is unknown.
pub trait ExchangeLookup: Send + Sync {
	fn exchange_is_known(&self, address: &Address) -> oneshot::Receiver<u64>;
}

/// Cache-through lookup over the `exchanges` table.
#[derive(Clone)]
pub struct PgExchangeLookup {
	pool: PgPool,
	by_address: Arc<DashMap<Address, u64>>,
	by_network: Arc<DashMap<u64, Vec<Address>>>,
}

impl PgExchangeLookup {
	pub fn new(pool: PgPool) -> Self {
		Self {
			pool,
			by_address: Arc::new(DashMap::new()),
			by_network: Arc::new(DashMap::new()),
		}
	}

	/// The network an exchange is deployed on, zero when unknown. Lookup
	/// failures degrade to zero so callers reject rather than crash.
	pub async fn network_for_exchange(&self, address: &Address) -> u64 {
		if let Some(network) = self.by_address.get(address) {
			return *network;
		}
		let row = sqlx::query("SELECT network FROM exchanges WHERE address = $1")
			.bind(address.as_slice())
			.fetch_optional(&self.pool)
			.await;
		match row.and_then(|row| row.map(|row| row.try_get::<i64, _>("network")).transpose()) {
			Ok(Some(network)) => {
				let network = network as u64;
				// Concurrent misses may race here; the row value is
				// identical so last-writer-wins is safe.
				self.by_address.insert(*address, network);
				network
			}
			Ok(None) => 0,
			Err(err) => {
				warn!(exchange = %address, %err, "exchange lookup failed");
				0
			}
		}
	}

	/// Every exchange deployed on a network.
	pub async fn exchanges_by_network(&self, network: u64) -> Result<Vec<Address>, DbError> {
		if let Some(addresses) = self.by_network.get(&network) {
			return Ok(addresses.clone());
		}
		let rows = sqlx::query("SELECT address FROM exchanges WHERE network = $1")
			.bind(network as i64)
			.fetch_all(&self.pool)
			.await?;
		let mut addresses = Vec::with_capacity(rows.len());
		for row in &rows {
			let raw: Vec<u8> = row.try_get("address")?;
			if raw.len() != 20 {
				return Err(DbError::CorruptRow(format!(
					"exchange address of {} bytes",
					raw.len()
				)));
			}
			addresses.push(Address::from_slice(&raw));
		}
		self.by_network.insert(network, addresses.clone());
		Ok(addresses)
	}
}

impl ExchangeLookup for PgExchangeLookup {
	fn exchange_is_known(&self, address: &Address) -> oneshot::Receiver<u64> {
		let (tx, rx) = oneshot::channel();
		let lookup = self.clone();
		let address = *address;
		tokio::spawn(async move {
			// The receiver may be gone if the request failed validation
			// first; the result is simply discarded.
			let _ = tx.send(lookup.network_for_exchange(&address).await);
		});
		rx
	}
}
