//! Order ingestion. Cheap structural checks run first, the three oracle
//! lookups overlap each other, and nothing is observable downstream until
//! every check has passed.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use tracing::{error, warn};

use relay_types::{Address, ApiError, ErrorCode, Order, ValidationErrorCode, U256};

use super::{error_response, is_json_request, read_capped_body, resolve_pool};
use crate::AppState;

/// Upper bound on how far ahead an expiration may point, in seconds.
const MAX_EXPIRATION_AHEAD_SECS: u64 = 31_536_000_000;

pub async fn handle(
	state: web::Data<AppState>,
	req: HttpRequest,
	mut payload: web::Payload,
) -> HttpResponse {
	let pool = match resolve_pool(&state, &req, true).await {
		Ok(pool) => pool,
		Err(response) => return response,
	};

	if !is_json_request(&req) {
		return error_response(
			400,
			ApiError::new(
				ErrorCode::VALIDATION_FAILED,
				"Unsupported HTTP request content type",
			),
		);
	}

	let body = match read_capped_body(&mut payload).await {
		Ok(body) => body,
		Err(response) => return response,
	};
	let mut order: Order = match serde_json::from_slice(&body) {
		Ok(order) => order,
		Err(err) => {
			warn!(%err, "malformed order body");
			return error_response(
				400,
				ApiError::new(ErrorCode::MALFORMED_JSON, "Malformed JSON"),
			);
		}
	};

	if !order.maker_asset_data.is_supported() {
		return error_response(
			400,
			ApiError::validation(
				"makerAssetData",
				ValidationErrorCode::UNSUPPORTED_OPTION,
				format!(
					"Unsupported asset type: 0x{}",
					hex::encode(order.maker_asset_data.proxy_id())
				),
			),
		);
	}
	if !order.taker_asset_data.is_supported() {
		return error_response(
			400,
			ApiError::validation(
				"takerAssetData",
				ValidationErrorCode::UNSUPPORTED_OPTION,
				format!(
					"Unsupported asset type: 0x{}",
					hex::encode(order.taker_asset_data.proxy_id())
				),
			),
		);
	}

	if !order.signature.is_supported() {
		return error_response(
			400,
			ApiError::validation(
				"signature",
				ValidationErrorCode::INVALID_SIGNATURE_OR_HASH,
				"Unsupported signature type",
			),
		);
	}
	if !order.signature.verify(order.maker_address, order.hash()) {
		return error_response(
			400,
			ApiError::validation(
				"signature",
				ValidationErrorCode::INVALID_SIGNATURE_OR_HASH,
				"Signature validation failed",
			),
		);
	}

	let now = Utc::now().timestamp().max(0) as u64;
	if order.expiration_time_seconds <= U256::from(now) {
		return error_response(
			400,
			ApiError::validation(
				"expirationTimeSeconds",
				ValidationErrorCode::VALUE_OUT_OF_RANGE,
				"Order already expired",
			),
		);
	}
	if order.expiration_time_seconds > U256::from(now) + U256::from(MAX_EXPIRATION_AHEAD_SECS) {
		return error_response(
			400,
			ApiError::validation(
				"expirationTimeSeconds",
				ValidationErrorCode::VALUE_OUT_OF_RANGE,
				"Expiration in distant future",
			),
		);
	}

	if order.taker_asset_amount == U256::ZERO {
		return error_response(
			400,
			ApiError::validation(
				"takerAssetAmount",
				ValidationErrorCode::VALUE_OUT_OF_RANGE,
				"takerAssetAmount must be > 0",
			),
		);
	}
	if order.maker_asset_amount == U256::ZERO {
		return error_response(
			400,
			ApiError::validation(
				"makerAssetAmount",
				ValidationErrorCode::VALUE_OUT_OF_RANGE,
				"makerAssetAmount must be > 0",
			),
		);
	}

	// Fan the three oracle reads out so their latencies overlap. A dropped
	// receiver just discards the oracle's result.
	let network_rx = state.exchanges.exchange_is_known(&order.exchange_address);
	let accounts = state.accounts.clone();
	let maker = order.maker_address;
	let account_task = tokio::spawn(async move { accounts.get(&maker).await });
	let affiliates = state.affiliates.clone();
	let fee_recipient = order.fee_recipient_address;
	let affiliate_task = tokio::spawn(async move { affiliates.get(&fee_recipient).await });

	let (network_id, account, affiliate) = tokio::join!(network_rx, account_task, affiliate_task);
	let network_id = network_id.unwrap_or(0);
	let account = account.unwrap_or_default();
	let affiliate = affiliate.ok().and_then(|found| found.ok());

	if network_id == 0 {
		return error_response(
			400,
			ApiError::validation(
				"exchangeContractAddress",
				ValidationErrorCode::INVALID_ADDRESS,
				"Unknown exchangeContractAddress",
			),
		);
	}

	if !pool.sender_addresses.is_empty() {
		let configured = pool
			.sender_addresses
			.get(&network_id)
			.copied()
			.unwrap_or(Address::ZERO);
		let permitted = configured == Address::ZERO
			|| order.sender_address == Address::ZERO
			|| order.sender_address == configured;
		if !permitted {
			return error_response(
				400,
				ApiError::validation(
					"senderAddress",
					ValidationErrorCode::INVALID_ADDRESS,
					"Invalid sender for this order pool / network",
				),
			);
		}
	}

	if pool.expiration > 0 && pool.expiration < now {
		return error_response(
			400,
			ApiError::new(ErrorCode::SUBMISSION_DISABLED, "Order Pool Expired"),
		);
	}

	if affiliate.is_none() {
		return error_response(
			400,
			ApiError::validation(
				"feeRecipient",
				ValidationErrorCode::INVALID_ADDRESS,
				"Invalid fee recipient",
			),
		);
	}

	let pool_fee = match pool.fee().await {
		Ok(fee) => fee,
		Err(err) => {
			error!(%err, "pool fee unavailable");
			return error_response(
				500,
				ApiError::validation(
					"pool",
					ValidationErrorCode::INVALID_ADDRESS,
					"Pool error",
				),
			);
		}
	};

	// The pool fee is this pool's asking price and the maker's discount
	// comes off the top, so the minimum acceptable total is their
	// difference.
	let min_fee = pool_fee.saturating_sub(account.discount());
	let total_fee = order.maker_fee.saturating_add(order.taker_fee);
	if total_fee < min_fee {
		let reason = format!("Total fee must be at least: {min_fee}");
		return error_response(
			400,
			ApiError::new(ErrorCode::VALIDATION_FAILED, "Validation Failed")
				.with_field(
					"makerFee",
					ValidationErrorCode::VALUE_OUT_OF_RANGE,
					reason.clone(),
				)
				.with_field("takerFee", ValidationErrorCode::VALUE_OUT_OF_RANGE, reason),
		);
	}

	if account.blacklisted() {
		// Deliberately indistinguishable from success on the wire.
		return HttpResponse::Accepted()
			.content_type("application/json")
			.finish();
	}

	order.pool_id = pool.id;
	if !state.publisher.publish(order.to_bytes()).await {
		error!(hash = %order.hash(), "unable to publish order");
		return error_response(
			500,
			ApiError::new(ErrorCode::VALIDATION_FAILED, "Validation Failed"),
		);
	}

	HttpResponse::Created()
		.content_type("application/json")
		.finish()
}
