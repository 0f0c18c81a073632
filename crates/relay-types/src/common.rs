//! Common primitives used throughout the relay.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serializer};

// Re-export the ethereum base types everything else builds on.
pub use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

/// Timestamp (Unix seconds)
pub type Timestamp = u64;

/// Map of network id to a 20-byte address. The zero address acts as a
/// wildcard wherever the map is consulted.
pub type NetworkAddressMap = HashMap<u64, Address>;

/// Serde adapter for `U256` as a base-10 string, the representation the
/// relayer API uses for every 256-bit quantity.
pub mod u256_decimal {
	use super::*;

	pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
		let raw = String::deserialize(deserializer)?;
		U256::from_str_radix(&raw, 10).map_err(serde::de::Error::custom)
	}
}

/// Parses a `0x`-prefixed hex string into an address. The empty string maps
/// to the zero address, matching the lenient order-config inputs.
pub fn parse_address(raw: &str) -> Result<Address, hex::FromHexError> {
	if raw.is_empty() {
		return Ok(Address::ZERO);
	}
	let stripped = raw
		.strip_prefix("0x")
		.or_else(|| raw.strip_prefix("0X"))
		.unwrap_or(raw);
	let bytes = hex::decode(stripped)?;
	if bytes.len() != 20 {
		return Err(hex::FromHexError::InvalidStringLength);
	}
	Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_address_accepts_prefixed_hex() {
		let addr = parse_address("0x00000000000000000000000000000000000000ff").unwrap();
		assert_eq!(addr, Address::with_last_byte(0xff));
	}

	#[test]
	fn parse_address_maps_empty_to_zero() {
		assert_eq!(parse_address("").unwrap(), Address::ZERO);
	}

	#[test]
	fn parse_address_rejects_short_input() {
		assert!(parse_address("0xff").is_err());
		assert!(parse_address("not hex").is_err());
	}
}
