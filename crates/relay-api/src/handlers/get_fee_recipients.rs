//! The registered fee recipients, paginated in memory over the full list.

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::error;

use relay_types::{ApiError, ErrorCode, PaginatedResponse};

use super::error_response;
use crate::pagination::{extract_pagination, query_pairs};
use crate::AppState;

pub async fn handle(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
	let pairs = query_pairs(req.query_string());
	let (page, per_page) = extract_pagination(&pairs);

	let affiliates = match state.affiliates.list().await {
		Ok(affiliates) => affiliates,
		Err(err) => {
			error!(%err, "affiliate listing failed");
			return error_response(
				500,
				ApiError::new(ErrorCode::VALIDATION_FAILED, "Internal server error"),
			);
		}
	};

	let total = affiliates.len();
	let start = (page.saturating_sub(1).saturating_mul(per_page) as usize).min(total);
	let end = (page.saturating_mul(per_page) as usize).min(total);
	let records: Vec<String> = affiliates[start..end]
		.iter()
		.map(|address| format!("{address:#x}"))
		.collect();

	HttpResponse::Ok().json(PaginatedResponse {
		total: total as u64,
		page,
		per_page,
		records,
	})
}
