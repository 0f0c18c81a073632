//! Tradeable asset pairs, optionally narrowed to one or both sides.

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::error;

use relay_db::AssetPairRecord;
use relay_types::{
	ApiError, AssetData, AssetPairEntry, AssetPairSide, ErrorCode, PaginatedResponse,
	ValidationErrorCode,
};

use super::error_response;
use crate::pagination::{extract_network_id, extract_pagination, query_pairs};
use crate::AppState;

pub async fn handle(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
	let pairs = query_pairs(req.query_string());
	let (page, per_page) = extract_pagination(&pairs);
	let network_id = extract_network_id(&pairs);

	let value = |key: &str| {
		pairs
			.iter()
			.rev()
			.find(|(name, _)| name == key)
			.map(|(_, found)| found.clone())
			.unwrap_or_default()
	};
	let mut asset_a = value("assetDataA");
	let mut asset_b = value("assetDataB");
	// One-sided queries always flow through the A side.
	if asset_a.is_empty() && !asset_b.is_empty() {
		std::mem::swap(&mut asset_a, &mut asset_b);
	}

	let result = if asset_a.is_empty() {
		state.asset_pairs.all(network_id, page, per_page).await
	} else {
		let data_a = match parse_asset_data(&asset_a, "assetDataA") {
			Ok(data) => data,
			Err(response) => return response,
		};
		if asset_b.is_empty() {
			state
				.asset_pairs
				.by_asset_data(&data_a, network_id, page, per_page)
				.await
		} else {
			let data_b = match parse_asset_data(&asset_b, "assetDataB") {
				Ok(data) => data,
				Err(response) => return response,
			};
			state
				.asset_pairs
				.by_asset_pair(&data_a, &data_b, network_id)
				.await
		}
	};

	match result {
		Ok((records, total)) => HttpResponse::Ok().json(PaginatedResponse {
			total,
			page,
			per_page,
			records: records.iter().map(entry_from_record).collect::<Vec<_>>(),
		}),
		Err(err) => {
			error!(%err, "asset pair query failed");
			error_response(
				500,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Internal error"),
			)
		}
	}
}

fn parse_asset_data(value: &str, field: &str) -> Result<AssetData, HttpResponse> {
	let stripped = value
		.strip_prefix("0x")
		.or_else(|| value.strip_prefix("0X"))
		.unwrap_or(value);
	hex::decode(stripped).map(AssetData::from).map_err(|_| {
		error_response(
			400,
			ApiError::validation(
				field,
				ValidationErrorCode::INCORRECT_FORMAT,
				"Unable to parse asset data specified in query",
			),
		)
	})
}

fn entry_from_record(record: &AssetPairRecord) -> AssetPairEntry {
	let side = |asset: &relay_db::AssetRecord| AssetPairSide {
		min_amount: asset.min_trade_amount.to_string(),
		max_amount: asset.max_trade_amount.to_string(),
		precision: asset.precision,
		asset_data: format!("0x{}", hex::encode(asset.data.as_bytes())),
	};
	AssetPairEntry {
		asset_data_a: side(&record.asset_a),
		asset_data_b: side(&record.asset_b),
	}
}
