//! Order signatures. The final byte of the signature blob selects the
//! signing scheme; only EIP-712 and EthSign are accepted by the relay.

use alloy_primitives::PrimitiveSignature;
use serde::{Deserialize, Serialize};

use crate::common::{keccak256, Address, Bytes, B256};

const ETH_SIGN_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Signature scheme selected by the trailing byte of the signature blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
	Illegal,
	Invalid,
	Eip712,
	EthSign,
	Wallet,
	Validator,
	PreSigned,
	Unknown(u8),
}

impl From<u8> for SignatureScheme {
	fn from(byte: u8) -> Self {
		match byte {
			0 => Self::Illegal,
			1 => Self::Invalid,
			2 => Self::Eip712,
			3 => Self::EthSign,
			4 => Self::Wallet,
			5 => Self::Validator,
			6 => Self::PreSigned,
			other => Self::Unknown(other),
		}
	}
}

/// A raw order signature: `v ‖ r ‖ s ‖ scheme` for the supported schemes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub Bytes);

impl Signature {
	/// Wire length of an ECDSA signature with its scheme byte.
	pub const ECDSA_LEN: usize = 66;

	pub fn new(bytes: impl Into<Bytes>) -> Self {
		Self(bytes.into())
	}

	pub fn scheme(&self) -> SignatureScheme {
		match self.0.last() {
			Some(byte) => SignatureScheme::from(*byte),
			None => SignatureScheme::Illegal,
		}
	}

	pub fn is_supported(&self) -> bool {
		matches!(self.scheme(), SignatureScheme::Eip712 | SignatureScheme::EthSign)
	}

	/// Checks the signature against `signer` for the given order hash.
	/// Any malformed input recovers to a mismatch rather than an error.
	pub fn verify(&self, signer: Address, hash: B256) -> bool {
		if self.0.len() != Self::ECDSA_LEN {
			return false;
		}
		let digest = match self.scheme() {
			SignatureScheme::Eip712 => hash,
			SignatureScheme::EthSign => {
				let mut message = Vec::with_capacity(ETH_SIGN_PREFIX.len() + 32);
				message.extend_from_slice(ETH_SIGN_PREFIX);
				message.extend_from_slice(hash.as_slice());
				keccak256(&message)
			}
			_ => return false,
		};
		let v = self.0[0];
		if v != 27 && v != 28 {
			return false;
		}
		let r = B256::from_slice(&self.0[1..33]);
		let s = B256::from_slice(&self.0[33..65]);
		let signature = PrimitiveSignature::from_scalars_and_parity(r, s, v == 28);
		match signature.recover_address_from_prehash(&digest) {
			Ok(recovered) => recovered == signer,
			Err(_) => false,
		}
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl From<Vec<u8>> for Signature {
	fn from(bytes: Vec<u8>) -> Self {
		Self(bytes.into())
	}
}
