//! Tagged asset-data byte strings. The leading four bytes select the
//! transfer proxy responsible for moving the asset on-chain.

use serde::{Deserialize, Serialize};

use crate::common::{Address, Bytes, U256};

pub const ERC20_PROXY_ID: [u8; 4] = [0xf4, 0x72, 0x61, 0xb0];
pub const ERC721_PROXY_ID: [u8; 4] = [0x02, 0x57, 0x17, 0x92];
pub const BITDEX_PROXY_ID: [u8; 4] = [0x5d, 0x38, 0x8e, 0x17];

/// A proxy-tagged asset description. ERC20 and BitDex carry a token address
/// at offset 16; ERC721 additionally carries a 32-byte token id at offset 36.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetData(pub Bytes);

impl AssetData {
	pub fn new(bytes: impl Into<Bytes>) -> Self {
		Self(bytes.into())
	}

	/// The four-byte proxy selector, zero-padded when the data is shorter.
	pub fn proxy_id(&self) -> [u8; 4] {
		let mut id = [0u8; 4];
		let len = self.0.len().min(4);
		id[..len].copy_from_slice(&self.0[..len]);
		id
	}

	pub fn is_type(&self, proxy_id: [u8; 4]) -> bool {
		self.0.len() >= 4 && self.0[..4] == proxy_id
	}

	pub fn is_supported(&self) -> bool {
		self.is_type(ERC20_PROXY_ID) || self.is_type(ERC721_PROXY_ID) || self.is_type(BITDEX_PROXY_ID)
	}

	/// The embedded token address, or zero when the data is unsupported or
	/// too short to contain one.
	pub fn token_address(&self) -> Address {
		if self.is_supported() && self.0.len() >= 36 {
			Address::from_slice(&self.0[16..36])
		} else {
			Address::ZERO
		}
	}

	/// The ERC721 token id, or zero for every other proxy type.
	pub fn token_id(&self) -> U256 {
		if self.is_type(ERC721_PROXY_ID) && self.0.len() >= 68 {
			U256::from_be_slice(&self.0[36..68])
		} else {
			U256::ZERO
		}
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl From<Vec<u8>> for AssetData {
	fn from(bytes: Vec<u8>) -> Self {
		Self(bytes.into())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn erc20(token: Address) -> AssetData {
		let mut data = Vec::with_capacity(36);
		data.extend_from_slice(&ERC20_PROXY_ID);
		data.extend_from_slice(&[0u8; 12]);
		data.extend_from_slice(token.as_slice());
		AssetData::from(data)
	}

	#[test]
	fn recognises_supported_proxies() {
		let token = Address::with_last_byte(7);
		let data = erc20(token);
		assert!(data.is_supported());
		assert_eq!(data.proxy_id(), ERC20_PROXY_ID);
		assert_eq!(data.token_address(), token);
		assert_eq!(data.token_id(), U256::ZERO);
	}

	#[test]
	fn rejects_unknown_selector() {
		let data = AssetData::from(vec![0xde, 0xad, 0xbe, 0xef, 0, 0]);
		assert!(!data.is_supported());
		assert_eq!(data.token_address(), Address::ZERO);
	}

	#[test]
	fn erc721_token_id() {
		let mut raw = Vec::new();
		raw.extend_from_slice(&ERC721_PROXY_ID);
		raw.extend_from_slice(&[0u8; 12]);
		raw.extend_from_slice(Address::with_last_byte(9).as_slice());
		raw.extend_from_slice(&U256::from(42u64).to_be_bytes::<32>());
		let data = AssetData::from(raw);
		assert_eq!(data.token_id(), U256::from(42u64));
	}

	#[test]
	fn short_data_never_panics() {
		let data = AssetData::from(vec![0xf4]);
		assert!(!data.is_supported());
		assert_eq!(data.proxy_id(), [0xf4, 0, 0, 0]);
		assert_eq!(data.token_address(), Address::ZERO);
		assert_eq!(data.token_id(), U256::ZERO);
	}

	#[test]
	fn json_form_is_hex() {
		let data = erc20(Address::with_last_byte(1));
		let json = serde_json::to_string(&data).unwrap();
		assert!(json.starts_with("\"0xf47261b0"));
		let back: AssetData = serde_json::from_str(&json).unwrap();
		assert_eq!(back, data);
	}
}
