//! The canonical trading intent: JSON form for the relayer API, EIP-712
//! hashing for identity, and the fixed-layout binary form handed to the
//! downstream queue.

use alloy_sol_types::{eip712_domain, SolStruct};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset_data::AssetData;
use crate::common::{Address, B256, U256};
use crate::signature::Signature;

mod eip712 {
	alloy_sol_types::sol! {
		struct Order {
			address makerAddress;
			address takerAddress;
			address feeRecipientAddress;
			address senderAddress;
			uint256 makerAssetAmount;
			uint256 takerAssetAmount;
			uint256 makerFee;
			uint256 takerFee;
			uint256 expirationTimeSeconds;
			uint256 salt;
			bytes makerAssetData;
			bytes takerAssetData;
		}
	}
}

/// A signed order as submitted by a maker. The pool id is assigned by the
/// relay after validation and never appears in the JSON representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	pub maker_address: Address,
	pub taker_address: Address,
	pub sender_address: Address,
	pub fee_recipient_address: Address,
	#[serde(with = "crate::common::u256_decimal")]
	pub maker_fee: U256,
	#[serde(with = "crate::common::u256_decimal")]
	pub taker_fee: U256,
	#[serde(with = "crate::common::u256_decimal")]
	pub maker_asset_amount: U256,
	#[serde(with = "crate::common::u256_decimal")]
	pub taker_asset_amount: U256,
	pub maker_asset_data: AssetData,
	pub taker_asset_data: AssetData,
	#[serde(with = "crate::common::u256_decimal")]
	pub salt: U256,
	pub exchange_address: Address,
	#[serde(with = "crate::common::u256_decimal")]
	pub expiration_time_seconds: U256,
	pub signature: Signature,
	#[serde(skip)]
	pub pool_id: B256,
}

/// Failure to decode the canonical binary layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderBytesError {
	#[error("order binary truncated at offset {0}")]
	Truncated(usize),
	#[error("order binary has {0} trailing bytes")]
	TrailingBytes(usize),
}

impl Order {
	/// The canonical EIP-712 hash. Deterministic over every field except
	/// the signature and the relay-assigned pool id.
	pub fn hash(&self) -> B256 {
		let domain = eip712_domain! {
			name: "0x Protocol",
			version: "2",
			verifying_contract: self.exchange_address,
		};
		let message = eip712::Order {
			makerAddress: self.maker_address,
			takerAddress: self.taker_address,
			feeRecipientAddress: self.fee_recipient_address,
			senderAddress: self.sender_address,
			makerAssetAmount: self.maker_asset_amount,
			takerAssetAmount: self.taker_asset_amount,
			makerFee: self.maker_fee,
			takerFee: self.taker_fee,
			expirationTimeSeconds: self.expiration_time_seconds,
			salt: self.salt,
			makerAssetData: self.maker_asset_data.as_bytes().to_vec().into(),
			takerAssetData: self.taker_asset_data.as_bytes().to_vec().into(),
		};
		message.eip712_signing_hash(&domain)
	}

	/// Fixed-layout binary encoding: five addresses, six 32-byte big-endian
	/// integers, the pool id, then the three variable fields each behind a
	/// u32 big-endian length prefix.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(
			324 + 12
				+ self.maker_asset_data.as_bytes().len()
				+ self.taker_asset_data.as_bytes().len()
				+ self.signature.as_bytes().len(),
		);
		out.extend_from_slice(self.maker_address.as_slice());
		out.extend_from_slice(self.taker_address.as_slice());
		out.extend_from_slice(self.sender_address.as_slice());
		out.extend_from_slice(self.fee_recipient_address.as_slice());
		out.extend_from_slice(self.exchange_address.as_slice());
		out.extend_from_slice(&self.maker_fee.to_be_bytes::<32>());
		out.extend_from_slice(&self.taker_fee.to_be_bytes::<32>());
		out.extend_from_slice(&self.maker_asset_amount.to_be_bytes::<32>());
		out.extend_from_slice(&self.taker_asset_amount.to_be_bytes::<32>());
		out.extend_from_slice(&self.salt.to_be_bytes::<32>());
		out.extend_from_slice(&self.expiration_time_seconds.to_be_bytes::<32>());
		out.extend_from_slice(self.pool_id.as_slice());
		for field in [
			self.maker_asset_data.as_bytes(),
			self.taker_asset_data.as_bytes(),
			self.signature.as_bytes(),
		] {
			out.extend_from_slice(&(field.len() as u32).to_be_bytes());
			out.extend_from_slice(field);
		}
		out
	}

	/// Decodes one order from the canonical binary layout, requiring the
	/// slice to contain exactly one order.
	pub fn from_bytes(raw: &[u8]) -> Result<Self, OrderBytesError> {
		let mut cursor = Cursor { raw, offset: 0 };
		let order = Self::read_from(&mut cursor)?;
		if cursor.offset != raw.len() {
			return Err(OrderBytesError::TrailingBytes(raw.len() - cursor.offset));
		}
		Ok(order)
	}

	fn read_from(cursor: &mut Cursor<'_>) -> Result<Self, OrderBytesError> {
		Ok(Self {
			maker_address: Address::from_slice(cursor.take(20)?),
			taker_address: Address::from_slice(cursor.take(20)?),
			sender_address: Address::from_slice(cursor.take(20)?),
			fee_recipient_address: Address::from_slice(cursor.take(20)?),
			exchange_address: Address::from_slice(cursor.take(20)?),
			maker_fee: U256::from_be_slice(cursor.take(32)?),
			taker_fee: U256::from_be_slice(cursor.take(32)?),
			maker_asset_amount: U256::from_be_slice(cursor.take(32)?),
			taker_asset_amount: U256::from_be_slice(cursor.take(32)?),
			salt: U256::from_be_slice(cursor.take(32)?),
			expiration_time_seconds: U256::from_be_slice(cursor.take(32)?),
			pool_id: B256::from_slice(cursor.take(32)?),
			maker_asset_data: AssetData::from(cursor.take_prefixed()?.to_vec()),
			taker_asset_data: AssetData::from(cursor.take_prefixed()?.to_vec()),
			signature: Signature::from(cursor.take_prefixed()?.to_vec()),
		})
	}
}

struct Cursor<'a> {
	raw: &'a [u8],
	offset: usize,
}

impl<'a> Cursor<'a> {
	fn take(&mut self, len: usize) -> Result<&'a [u8], OrderBytesError> {
		if self.raw.len() - self.offset < len {
			return Err(OrderBytesError::Truncated(self.offset));
		}
		let slice = &self.raw[self.offset..self.offset + len];
		self.offset += len;
		Ok(slice)
	}

	fn take_prefixed(&mut self) -> Result<&'a [u8], OrderBytesError> {
		let mut len = [0u8; 4];
		len.copy_from_slice(self.take(4)?);
		self.take(u32::from_be_bytes(len) as usize)
	}
}
