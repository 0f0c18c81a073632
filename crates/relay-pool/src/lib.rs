//! Per-tenant order pool policy: which senders a pool admits, when it
//! expires, what share of the base fee it charges, and the optional
//! on-chain veto contract.

use async_trait::async_trait;
use alloy_sol_types::{sol, SolCall};
use thiserror::Error;

use relay_storage::{BaseFee, StorageError};
use relay_types::{Address, NetworkAddressMap, Order, B256, U256};

pub mod registry;

pub use registry::{pool_id, MemoryPoolStore, PoolRegistry, PoolStore};

/// Fixed-point base of the fee share: a share of 10^18 charges exactly the
/// base fee.
pub const FEE_BASE_UNITS: u128 = 1_000_000_000_000_000_000;

sol! {
	function filter(bytes32 poolId, bytes order) external view returns (bool accepted);
}

#[derive(Debug, Error)]
pub enum PoolError {
	#[error("Pool Not Found: {0}")]
	NotFound(String),
	#[error("pool has no base fee handle")]
	MissingBaseFee,
	#[error("fee computation overflowed")]
	FeeOverflow,
	#[error("malformed pool search terms: {0}")]
	SearchTerms(String),
	#[error("filter call failed: {0}")]
	Filter(String),
	#[error("pool store error: {0}")]
	Store(String),
	#[error(transparent)]
	BaseFee(#[from] StorageError),
}

/// Read-only contract call capability. The consumer that owns the chain
/// connection passes this in; the pool never holds a connection itself.
#[async_trait]
pub trait FilterCaller: Send + Sync {
	async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, PoolError>;
}

/// Tenant configuration resolved from the pool registry.
#[derive(Debug, Clone)]
pub struct Pool {
	pub id: B256,
	pub search_terms: String,
	/// Unix seconds; zero never expires.
	pub expiration: u64,
	/// Decimal integer scaled by 10^18. Anything that does not parse as a
	/// positive integer falls back to charging the plain base fee.
	pub fee_share: String,
	pub sender_addresses: NetworkAddressMap,
	pub filter_addresses: NetworkAddressMap,
	/// Attached by the registry for the fee-charging endpoints.
	pub base_fee: Option<BaseFee>,
}

impl Default for Pool {
	fn default() -> Self {
		Self {
			id: pool_id(""),
			search_terms: String::new(),
			expiration: 0,
			fee_share: String::new(),
			sender_addresses: NetworkAddressMap::new(),
			filter_addresses: NetworkAddressMap::new(),
			base_fee: None,
		}
	}
}

// Pools compare by policy; the base-fee handle is runtime plumbing.
impl PartialEq for Pool {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
			&& self.search_terms == other.search_terms
			&& self.expiration == other.expiration
			&& self.fee_share == other.fee_share
			&& self.sender_addresses == other.sender_addresses
			&& self.filter_addresses == other.filter_addresses
	}
}

impl Pool {
	pub fn set_base_fee(&mut self, base_fee: BaseFee) {
		self.base_fee = Some(base_fee);
	}

	/// The fee this pool charges right now: base fee scaled by the pool's
	/// fee share. Fails only when the base-fee read fails.
	pub async fn fee(&self) -> Result<U256, PoolError> {
		let handle = self.base_fee.as_ref().ok_or(PoolError::MissingBaseFee)?;
		let base_fee = handle.get().await?;
		match U256::from_str_radix(self.fee_share.trim(), 10) {
			Ok(share) if share > U256::ZERO => {
				let combined = base_fee.checked_mul(share).ok_or(PoolError::FeeOverflow)?;
				Ok(combined / U256::from(FEE_BASE_UNITS))
			}
			_ => Ok(base_fee),
		}
	}

	/// Consults the pool's on-chain veto contract for the given network.
	/// No filter map means everything passes; an unmapped network means
	/// nothing does; the zero address waives the check.
	pub async fn check_filter(
		&self,
		order: &Order,
		network_id: u64,
		caller: &dyn FilterCaller,
	) -> Result<bool, PoolError> {
		if self.filter_addresses.is_empty() {
			return Ok(true);
		}
		let Some(address) = self.filter_addresses.get(&network_id) else {
			return Ok(false);
		};
		if *address == Address::ZERO {
			return Ok(true);
		}
		let call = filterCall {
			poolId: self.id,
			order: order.to_bytes().into(),
		};
		let returned = caller.eth_call(*address, call.abi_encode()).await?;
		let decoded = filterCall::abi_decode_returns(&returned, true)
			.map_err(|err| PoolError::Filter(err.to_string()))?;
		Ok(decoded.accepted)
	}

	/// The pool's search-term prefilter as key/value pairs, applied ahead
	/// of the caller's own query. Malformed percent-encoding is fatal to
	/// the query it would have filtered.
	pub fn search_pairs(&self) -> Result<Vec<(String, String)>, PoolError> {
		validate_percent_encoding(&self.search_terms).map_err(PoolError::SearchTerms)?;
		Ok(form_urlencoded::parse(self.search_terms.as_bytes())
			.into_owned()
			.collect())
	}
}

fn validate_percent_encoding(raw: &str) -> Result<(), String> {
	let bytes = raw.as_bytes();
	let mut index = 0;
	while index < bytes.len() {
		if bytes[index] == b'%' {
			if index + 3 > bytes.len()
				|| !bytes[index + 1].is_ascii_hexdigit()
				|| !bytes[index + 2].is_ascii_hexdigit()
			{
				return Err(format!("invalid escape at byte {index}"));
			}
			index += 3;
		} else {
			index += 1;
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	use alloy_sol_types::SolValue;
	use relay_storage::MemoryKv;

	async fn pool_with_base_fee(fee_share: &str, base: u128) -> Pool {
		let base_fee = BaseFee::new(Arc::new(MemoryKv::new()));
		base_fee.set(U256::from(base)).await.unwrap();
		let mut pool = Pool {
			fee_share: fee_share.to_string(),
			..Pool::default()
		};
		pool.set_base_fee(base_fee);
		pool
	}

	#[tokio::test]
	async fn unit_fee_share_charges_base_fee() {
		let pool = pool_with_base_fee("1000000000000000000", FEE_BASE_UNITS).await;
		assert_eq!(pool.fee().await.unwrap(), U256::from(FEE_BASE_UNITS));
	}

	#[tokio::test]
	async fn half_fee_share_halves_the_fee() {
		let pool = pool_with_base_fee("500000000000000000", FEE_BASE_UNITS).await;
		assert_eq!(
			pool.fee().await.unwrap(),
			U256::from(FEE_BASE_UNITS / 2)
		);
	}

	#[tokio::test]
	async fn unparseable_fee_share_falls_back_to_base_fee() {
		for share in ["", "free", "-3", "0"] {
			let pool = pool_with_base_fee(share, 1_000).await;
			assert_eq!(pool.fee().await.unwrap(), U256::from(1_000u64), "share {share:?}");
		}
	}

	#[tokio::test]
	async fn fee_without_base_fee_handle_errors() {
		let pool = Pool::default();
		assert!(matches!(pool.fee().await, Err(PoolError::MissingBaseFee)));
	}

	struct StaticCaller {
		accept: bool,
		called: std::sync::atomic::AtomicUsize,
	}

	#[async_trait]
	impl FilterCaller for StaticCaller {
		async fn eth_call(&self, _to: Address, data: Vec<u8>) -> Result<Vec<u8>, PoolError> {
			self.called.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
			// Round-trip the calldata so the encoding is exercised too.
			filterCall::abi_decode(&data, true).map_err(|err| PoolError::Filter(err.to_string()))?;
			Ok(self.accept.abi_encode())
		}
	}

	fn caller(accept: bool) -> StaticCaller {
		StaticCaller {
			accept,
			called: std::sync::atomic::AtomicUsize::new(0),
		}
	}

	#[tokio::test]
	async fn filter_decision_table() {
		let order = Order::default();
		let mut pool = Pool::default();
		let caller_accept = caller(true);

		// no filter map: pass without calling out
		assert!(pool.check_filter(&order, 1, &caller_accept).await.unwrap());

		// unmapped network: fail without calling out
		pool.filter_addresses.insert(1, Address::with_last_byte(9));
		assert!(!pool.check_filter(&order, 2, &caller_accept).await.unwrap());

		// zero address waives the check
		pool.filter_addresses.insert(3, Address::ZERO);
		assert!(pool.check_filter(&order, 3, &caller_accept).await.unwrap());
		assert_eq!(caller_accept.called.load(std::sync::atomic::Ordering::SeqCst), 0);

		// configured contract decides
		assert!(pool.check_filter(&order, 1, &caller_accept).await.unwrap());
		assert!(!pool.check_filter(&order, 1, &caller(false)).await.unwrap());
	}

	#[test]
	fn search_pairs_parse() {
		let pool = Pool {
			search_terms: "makerAssetAddress=0x1234&status=0".to_string(),
			..Pool::default()
		};
		assert_eq!(
			pool.search_pairs().unwrap(),
			vec![
				("makerAssetAddress".to_string(), "0x1234".to_string()),
				("status".to_string(), "0".to_string()),
			]
		);
	}

	#[test]
	fn search_pairs_reject_bad_escapes() {
		let pool = Pool {
			search_terms: "maker=%zz".to_string(),
			..Pool::default()
		};
		assert!(matches!(pool.search_pairs(), Err(PoolError::SearchTerms(_))));
	}
}
