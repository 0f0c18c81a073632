//! Wire types for the standard relayer API: the error envelope, pagination
//! wrappers and the request/response bodies the handlers exchange.

use serde::{Deserialize, Serialize};

use crate::order::Order;

/// Top-level error code of the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
	pub const VALIDATION_FAILED: Self = Self(100);
	pub const MALFORMED_JSON: Self = Self(101);
	pub const SUBMISSION_DISABLED: Self = Self(102);
	pub const THROTTLED: Self = Self(103);
}

/// Field-level validation error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrorCode(pub u16);

impl ValidationErrorCode {
	pub const REQUIRED_FIELD: Self = Self(1000);
	pub const INCORRECT_FORMAT: Self = Self(1001);
	pub const INVALID_ADDRESS: Self = Self(1002);
	pub const ADDRESS_NOT_SUPPORTED: Self = Self(1003);
	pub const VALUE_OUT_OF_RANGE: Self = Self(1004);
	pub const INVALID_SIGNATURE_OR_HASH: Self = Self(1005);
	pub const UNSUPPORTED_OPTION: Self = Self(1006);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
	pub field: String,
	pub code: ValidationErrorCode,
	pub reason: String,
}

/// The JSON error envelope every non-2xx response carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
	pub code: ErrorCode,
	pub reason: String,
	#[serde(
		rename = "validationErrors",
		default,
		skip_serializing_if = "Vec::is_empty"
	)]
	pub validation_errors: Vec<ValidationError>,
}

impl ApiError {
	pub fn new(code: ErrorCode, reason: impl Into<String>) -> Self {
		Self {
			code,
			reason: reason.into(),
			validation_errors: Vec::new(),
		}
	}

	pub fn with_field(
		mut self,
		field: impl Into<String>,
		code: ValidationErrorCode,
		reason: impl Into<String>,
	) -> Self {
		self.validation_errors.push(ValidationError {
			field: field.into(),
			code,
			reason: reason.into(),
		});
		self
	}

	/// The standard single-field validation failure.
	pub fn validation(
		field: impl Into<String>,
		code: ValidationErrorCode,
		reason: impl Into<String>,
	) -> Self {
		Self::new(ErrorCode::VALIDATION_FAILED, "Validation Failed").with_field(field, code, reason)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
	pub total: u64,
	pub page: u64,
	#[serde(rename = "perPage")]
	pub per_page: u64,
	pub records: Vec<T>,
}

/// Derived order state attached to every order the query surface returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetadata {
	pub hash: String,
	pub fee_rate: f64,
	pub status: i64,
	pub taker_asset_amount_remaining: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
	pub order: Order,
	#[serde(rename = "metaData")]
	pub metadata: OrderMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookResponse {
	pub bids: PaginatedResponse<OrderRecord>,
	pub asks: PaginatedResponse<OrderRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPairSide {
	pub min_amount: String,
	pub max_amount: String,
	pub precision: u8,
	pub asset_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPairEntry {
	#[serde(rename = "assetDataA")]
	pub asset_data_a: AssetPairSide,
	#[serde(rename = "assetDataB")]
	pub asset_data_b: AssetPairSide,
}

/// The pre-submission advisory request. Only the maker and exchange inputs
/// influence the response; the remaining fields are accepted for parity
/// with the order shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfigRequest {
	#[serde(default)]
	pub maker_address: String,
	#[serde(default)]
	pub taker_address: String,
	#[serde(default)]
	pub maker_asset_amount: String,
	#[serde(default)]
	pub taker_asset_amount: String,
	#[serde(default)]
	pub maker_asset_data: String,
	#[serde(default)]
	pub taker_asset_data: String,
	#[serde(default)]
	pub exchange_address: String,
	#[serde(default)]
	pub expiration_time_seconds: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfigResponse {
	pub sender_address: String,
	pub fee_recipient_address: String,
	pub maker_fee: String,
	pub taker_fee: String,
}

/// Health-check body. The capitalised keys are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
	#[serde(rename = "Time")]
	pub time: Vec<String>,
	#[serde(rename = "BlockHash")]
	pub block_hash: String,
}
