//! Handler implementations plus the helpers they share: pool scoping,
//! capped body reads and response formatting.

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use tracing::error;

use relay_pool::{Pool, PoolError};
use relay_types::{ApiError, ErrorCode, OrderRecord, PaginatedResponse};

use crate::AppState;

pub mod get_asset_pairs;
pub mod get_fee_recipients;
pub mod get_health;
pub mod get_order;
pub mod get_orderbook;
pub mod get_orders;
pub mod post_order;
pub mod post_order_config;

/// Hard cap on request bodies; longer submissions are rejected outright.
pub const MAX_BODY_BYTES: usize = 4096;

pub(crate) fn error_response(status: u16, error: ApiError) -> HttpResponse {
	let status = actix_web::http::StatusCode::from_u16(status)
		.unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
	HttpResponse::build(status).json(error)
}

/// Resolves the tenant from the optional leading path segment; the empty
/// segment is the default pool. This runs before anything else in every
/// pool-scoped handler.
pub(crate) async fn resolve_pool(
	state: &AppState,
	req: &HttpRequest,
	with_base_fee: bool,
) -> Result<Pool, HttpResponse> {
	let name = req.match_info().get("pool").unwrap_or("");
	let resolved = if with_base_fee {
		state
			.registry
			.resolve_with_base_fee(name, state.base_fee.clone())
			.await
	} else {
		state.registry.resolve(name).await
	};
	match resolved {
		Ok(pool) => Ok(pool),
		Err(err @ PoolError::NotFound(_)) => Err(error_response(
			404,
			ApiError::new(ErrorCode::SUBMISSION_DISABLED, err.to_string()),
		)),
		Err(err) => {
			error!(pool = %name, %err, "pool resolution failed");
			Err(error_response(
				500,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Internal error"),
			))
		}
	}
}

pub(crate) fn is_json_request(req: &HttpRequest) -> bool {
	req.headers()
		.get(header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.map(|value| value.split(';').next().unwrap_or("").trim() == "application/json")
		.unwrap_or(false)
}

pub(crate) fn wants_binary(req: &HttpRequest) -> bool {
	req.headers()
		.get(header::ACCEPT)
		.and_then(|value| value.to_str().ok())
		.map(|value| value.split(';').next().unwrap_or("").trim() == "application/octet-stream")
		.unwrap_or(false)
}

/// Reads the body up to [`MAX_BODY_BYTES`], never buffering past the cap.
pub(crate) async fn read_capped_body(
	payload: &mut web::Payload,
) -> Result<web::BytesMut, HttpResponse> {
	let mut body = web::BytesMut::new();
	while let Some(chunk) = payload.next().await {
		let chunk = chunk.map_err(|err| {
			error!(%err, "error reading request body");
			error_response(
				500,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Error reading content"),
			)
		})?;
		if body.len() + chunk.len() > MAX_BODY_BYTES {
			return Err(error_response(
				400,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Request body too large"),
			));
		}
		body.extend_from_slice(&chunk);
	}
	Ok(body)
}

/// Orders as JSON pagination or, under `Accept: application/octet-stream`,
/// the canonical binary encodings concatenated without framing.
pub(crate) fn respond_orders(
	records: Vec<OrderRecord>,
	total: u64,
	page: u64,
	per_page: u64,
	binary: bool,
) -> HttpResponse {
	if binary {
		let mut body = Vec::new();
		for record in &records {
			body.extend_from_slice(&record.order.to_bytes());
		}
		return HttpResponse::Ok()
			.content_type("application/octet-stream")
			.body(body);
	}
	HttpResponse::Ok().json(PaginatedResponse {
		total,
		page,
		per_page,
		records,
	})
}
