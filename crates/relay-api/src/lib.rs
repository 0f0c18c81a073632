//! The standard relayer HTTP API: routing, pool scoping and the handlers
//! behind every endpoint.

use std::sync::Arc;

use actix_web::web;

use relay_accounts::{AccountService, AffiliateService};
use relay_channels::{BlockHash, Publisher};
use relay_db::{AssetPairStore, ExchangeLookup, OrderStore};
use relay_pool::PoolRegistry;
use relay_storage::{BaseFee, KvStore};
use relay_types::Address;

pub mod handlers;
pub mod pagination;

/// Everything a handler needs, injected once at startup.
#[derive(Clone)]
pub struct AppState {
	pub registry: PoolRegistry,
	pub orders: Arc<dyn OrderStore>,
	pub asset_pairs: Arc<dyn AssetPairStore>,
	pub exchanges: Arc<dyn ExchangeLookup>,
	pub accounts: AccountService,
	pub affiliates: AffiliateService,
	pub publisher: Arc<dyn Publisher>,
	pub kv: Arc<dyn KvStore>,
	pub base_fee: BaseFee,
	pub block_hash: BlockHash,
	/// Default fee recipient advertised by the order-config endpoint.
	pub fee_recipient: Address,
}

/// Registers the full route table: the bare `/v2` scope, the pool-prefixed
/// variant, and the unprefixed health check.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.route("/_hc", web::get().to(handlers::get_health::handle));
	cfg.service(web::scope("/v2").configure(v2_scope));
	cfg.service(web::scope("/{pool}/v2").configure(v2_scope));
}

fn v2_scope(cfg: &mut web::ServiceConfig) {
	cfg.route(
		"/asset_pairs",
		web::get().to(handlers::get_asset_pairs::handle),
	);
	cfg.route("/orders", web::get().to(handlers::get_orders::handle));
	cfg.route("/order/{hash}", web::get().to(handlers::get_order::handle));
	cfg.route("/orderbook", web::get().to(handlers::get_orderbook::handle));
	cfg.route(
		"/fee_recipients",
		web::get().to(handlers::get_fee_recipients::handle),
	);
	cfg.route("/order", web::post().to(handlers::post_order::handle));
	cfg.route(
		"/order_config",
		web::post().to(handlers::post_order_config::handle),
	);
}
