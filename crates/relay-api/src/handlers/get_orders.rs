//! Paginated order search, scoped to the resolved pool. The pool's
//! search-term prefilter applies before the caller's own parameters.

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::error;

use relay_db::{DbError, OrderFilter};
use relay_types::{ApiError, ErrorCode, ValidationErrorCode};

use super::{error_response, resolve_pool, respond_orders, wants_binary};
use crate::pagination::{extract_pagination, query_pairs};
use crate::AppState;

pub async fn handle(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
	let pool = match resolve_pool(&state, &req, false).await {
		Ok(pool) => pool,
		Err(response) => return response,
	};

	let pairs = query_pairs(req.query_string());
	let (page, per_page) = extract_pagination(&pairs);

	// A broken pool prefilter is the operator's fault, not the caller's.
	let mut filter = match pool_prefilter(&pool) {
		Ok(filter) => filter,
		Err(response) => return response,
	};
	let borrowed: Vec<(&str, &str)> = pairs
		.iter()
		.map(|(key, value)| (key.as_str(), value.as_str()))
		.collect();
	if let Err(err) = filter.apply_pairs(borrowed) {
		return bad_filter_response(err);
	}
	filter.pool_id = Some(pool.id);

	match state.orders.search(&filter, page, per_page).await {
		Ok((records, total)) => {
			respond_orders(records, total, page, per_page, wants_binary(&req))
		}
		Err(err) => {
			error!(%err, "order search failed");
			error_response(
				500,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Internal error"),
			)
		}
	}
}

pub(crate) fn pool_prefilter(pool: &relay_pool::Pool) -> Result<OrderFilter, HttpResponse> {
	let pairs = pool.search_pairs().map_err(|err| {
		error!(%err, "pool search terms are unusable");
		error_response(
			500,
			ApiError::new(ErrorCode::VALIDATION_FAILED, "Internal error"),
		)
	})?;
	let borrowed: Vec<(&str, &str)> = pairs
		.iter()
		.map(|(key, value)| (key.as_str(), value.as_str()))
		.collect();
	OrderFilter::from_pairs(borrowed).map_err(|err| {
		error!(%err, "pool search terms are unusable");
		error_response(
			500,
			ApiError::new(ErrorCode::VALIDATION_FAILED, "Internal error"),
		)
	})
}

pub(crate) fn bad_filter_response(err: DbError) -> HttpResponse {
	match err {
		DbError::BadFilterValue { field, detail } => error_response(
			400,
			ApiError::validation(field, ValidationErrorCode::INCORRECT_FORMAT, detail),
		),
		other => {
			error!(err = %other, "unexpected filter failure");
			error_response(
				500,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Internal error"),
			)
		}
	}
}
