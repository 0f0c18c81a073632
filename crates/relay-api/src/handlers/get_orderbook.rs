//! Both sides of the book for one asset pair: bids sell the quote asset
//! for the base asset, asks sell the base for the quote.

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::error;

use relay_types::{
	ApiError, AssetData, ErrorCode, OrderbookResponse, PaginatedResponse, ValidationErrorCode,
};

use super::get_orders::pool_prefilter;
use super::{error_response, resolve_pool};
use crate::pagination::{extract_pagination, query_pairs};
use crate::AppState;

pub async fn handle(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
	let pool = match resolve_pool(&state, &req, false).await {
		Ok(pool) => pool,
		Err(response) => return response,
	};

	let pairs = query_pairs(req.query_string());
	let (page, per_page) = extract_pagination(&pairs);

	let base = match required_asset_data(&pairs, "baseAssetData") {
		Ok(data) => data,
		Err(response) => return response,
	};
	let quote = match required_asset_data(&pairs, "quoteAssetData") {
		Ok(data) => data,
		Err(response) => return response,
	};

	let mut template = match pool_prefilter(&pool) {
		Ok(filter) => filter,
		Err(response) => return response,
	};
	template.pool_id = Some(pool.id);

	let mut bids_filter = template.clone();
	bids_filter.maker_asset_data = Some(quote.clone());
	bids_filter.taker_asset_data = Some(base.clone());
	let mut asks_filter = template;
	asks_filter.maker_asset_data = Some(base);
	asks_filter.taker_asset_data = Some(quote);

	let (bids, asks) = tokio::join!(
		state.orders.search(&bids_filter, page, per_page),
		state.orders.search(&asks_filter, page, per_page),
	);
	match (bids, asks) {
		(Ok((bids, bids_total)), Ok((asks, asks_total))) => {
			HttpResponse::Ok().json(OrderbookResponse {
				bids: PaginatedResponse {
					total: bids_total,
					page,
					per_page,
					records: bids,
				},
				asks: PaginatedResponse {
					total: asks_total,
					page,
					per_page,
					records: asks,
				},
			})
		}
		(Err(err), _) | (_, Err(err)) => {
			error!(%err, "orderbook search failed");
			error_response(
				500,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Internal error"),
			)
		}
	}
}

fn required_asset_data(
	pairs: &[(String, String)],
	field: &str,
) -> Result<AssetData, HttpResponse> {
	let value = pairs
		.iter()
		.rev()
		.find(|(key, _)| key == field)
		.map(|(_, value)| value.as_str())
		.unwrap_or("");
	if value.is_empty() {
		return Err(error_response(
			400,
			ApiError::validation(
				field,
				ValidationErrorCode::REQUIRED_FIELD,
				format!("{field} is required"),
			),
		));
	}
	let stripped = value
		.strip_prefix("0x")
		.or_else(|| value.strip_prefix("0X"))
		.unwrap_or(value);
	match hex::decode(stripped) {
		Ok(bytes) => Ok(AssetData::from(bytes)),
		Err(err) => Err(error_response(
			400,
			ApiError::validation(
				field,
				ValidationErrorCode::INCORRECT_FORMAT,
				err.to_string(),
			),
		)),
	}
}
