//! Service health: the shared store, the database and the block feed all
//! have to answer before the relay reports itself alive.

use actix_web::{web, HttpResponse};
use tracing::error;

use relay_types::{ApiError, ErrorCode, HealthReport};

use super::error_response;
use crate::AppState;

pub async fn handle(state: web::Data<AppState>) -> HttpResponse {
	let time = match state.kv.server_time().await {
		Ok(time) => time,
		Err(err) => {
			error!(%err, "store health probe failed");
			return unhealthy();
		}
	};

	if let Err(err) = state.orders.ping().await {
		error!(%err, "database health probe failed");
		return unhealthy();
	}

	let block_hash = state.block_hash.get();
	if block_hash.is_empty() {
		error!("no block hash observed yet");
		return unhealthy();
	}

	HttpResponse::Ok().json(HealthReport { time, block_hash })
}

fn unhealthy() -> HttpResponse {
	error_response(
		500,
		ApiError::new(ErrorCode::SUBMISSION_DISABLED, "Internal error"),
	)
}
