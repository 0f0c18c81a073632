//! The pre-submission advisory. Computed from the same policy inputs as
//! ingestion so a maker can take the response verbatim and pass.

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{error, warn};

use relay_types::{
	parse_address, Address, ApiError, ErrorCode, OrderConfigRequest, OrderConfigResponse,
	ValidationErrorCode,
};

use super::{error_response, is_json_request, read_capped_body, resolve_pool};
use crate::AppState;

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
	let request: OrderConfigRequest = match serde_json::from_slice(&body) {
		Ok(request) => request,
		Err(err) => {
			warn!(%err, "malformed order config body");
			return error_response(
				400,
				ApiError::new(ErrorCode::MALFORMED_JSON, "Malformed JSON"),
			);
		}
	};

	let maker_address = match parse_address(&request.maker_address) {
		Ok(address) => address,
		Err(_) => {
			return error_response(
				400,
				ApiError::validation(
					"makerAddress",
					ValidationErrorCode::INCORRECT_FORMAT,
					"Invalid address format",
				),
			)
		}
	};
	let exchange_address = match parse_address(&request.exchange_address) {
		Ok(address) => address,
		Err(_) => {
			return error_response(
				400,
				ApiError::validation(
					"exchangeAddress",
					ValidationErrorCode::INCORRECT_FORMAT,
					"Invalid address format",
				),
			)
		}
	};

	// Same fan-out as ingestion: the advisory must not drift from what the
	// validator will demand.
	let network_rx = state.exchanges.exchange_is_known(&exchange_address);
	let accounts = state.accounts.clone();
	let account_task = tokio::spawn(async move { accounts.get(&maker_address).await });
	let affiliates = state.affiliates.clone();
	let default_recipient = state.fee_recipient;
	let affiliate_task = tokio::spawn(async move { affiliates.get(&default_recipient).await });

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
	let min_fee = pool_fee.saturating_sub(account.discount());

	let sender = pool
		.sender_addresses
		.get(&network_id)
		.copied()
		.unwrap_or(Address::ZERO);

	HttpResponse::Created().json(OrderConfigResponse {
		sender_address: format!("{sender:#x}"),
		fee_recipient_address: format!("{:#x}", state.fee_recipient),
		maker_fee: min_fee.to_string(),
		taker_fee: "0".to_string(),
	})
}
