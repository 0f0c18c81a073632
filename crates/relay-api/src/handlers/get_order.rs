//! Single-order retrieval by canonical hash.

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::error;

use relay_types::{ApiError, ErrorCode, ValidationErrorCode, B256};

use super::{error_response, wants_binary};
use crate::AppState;

pub async fn handle(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
	let raw = req.match_info().get("hash").unwrap_or("");
	let Some(stripped) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) else {
		// No 0x marker means the path does not name an order at all.
		return error_response(
			404,
			ApiError::new(ErrorCode::VALIDATION_FAILED, "Malformed order hash").with_field(
				"orderHash",
				ValidationErrorCode::INCORRECT_FORMAT,
				"Order hash is not specified or specified incorrectly",
			),
		);
	};
	let hash = match hex::decode(stripped) {
		Ok(bytes) if bytes.len() == 32 => B256::from_slice(&bytes),
		_ => {
			return error_response(
				400,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Malformed order hash").with_field(
					"orderHash",
					ValidationErrorCode::INCORRECT_FORMAT,
					"Order hash is specified incorrectly",
				),
			)
		}
	};

	match state.orders.find_by_hash(&hash).await {
		Ok(Some(record)) => {
			if wants_binary(&req) {
				HttpResponse::Ok()
					.content_type("application/octet-stream")
					.body(record.order.to_bytes())
			} else {
				HttpResponse::Ok().json(record)
			}
		}
		Ok(None) => error_response(
			404,
			ApiError::new(
				ErrorCode::VALIDATION_FAILED,
				format!("Order with specified hash {hash:#x} is not found"),
			),
		),
		Err(err) => {
			error!(%err, "order lookup failed");
			error_response(
				500,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Internal error"),
			)
		}
	}
}
