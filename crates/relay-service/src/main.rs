//! The relay API binary: positional configuration, service wiring and the
//! HTTP listener.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_accounts::{AccountService, AffiliateService};
use relay_api::AppState;
use relay_channels::{BlockHash, RedisQueue};
use relay_db::{PgAssetPairStore, PgExchangeLookup, PgOrderStore, PgPoolStore};
use relay_pool::PoolRegistry;
use relay_storage::{BaseFee, KvStore, RedisKv};
use relay_types::parse_address;

#[derive(Parser)]
#[command(name = "relay-api", about = "Off-chain order relay API", long_about = None)]
struct Args {
	/// PostgreSQL connection URL
	db_url: String,
	/// PostgreSQL password, applied over the URL
	db_password: String,
	/// Redis address backing the shared key-value store
	redis_url: String,
	/// queue:// URI of the block-header feed
	redis_block_queue_url: String,
	/// queue:// URI of the validated-order output queue
	redis_output_queue_url: String,
	/// Default fee recipient address, 0x-prefixed hex
	fee_recipient: String,
	/// Listen port
	#[arg(default_value_t = 8080)]
	port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
	setup_tracing();
	let args = Args::parse();

	if args.fee_recipient.is_empty() {
		bail!("fee recipient address must not be empty");
	}
	let fee_recipient =
		parse_address(&args.fee_recipient).context("unable to parse fee recipient address")?;

	let db = relay_db::connect(&args.db_url, &args.db_password)
		.await
		.context("unable to connect to PostgreSQL")?;

	let redis = RedisKv::connect(&args.redis_url)
		.await
		.context("unable to connect to Redis")?;

	let block_queue = RedisQueue::from_uri(&args.redis_block_queue_url, redis.manager())
		.context("unable to open the block queue")?;
	let block_hash = BlockHash::channeled(&block_queue);

	let publisher = RedisQueue::from_uri(&args.redis_output_queue_url, redis.manager())
		.context("unable to open the output queue")?;

	let kv: Arc<dyn KvStore> = Arc::new(redis);
	let state = AppState {
		registry: PoolRegistry::new(Arc::new(PgPoolStore::new(db.clone()))),
		orders: Arc::new(PgOrderStore::new(db.clone())),
		asset_pairs: Arc::new(PgAssetPairStore::new(db.clone())),
		exchanges: Arc::new(PgExchangeLookup::new(db)),
		accounts: AccountService::new(kv.clone()),
		affiliates: AffiliateService::new(kv.clone()),
		publisher: Arc::new(publisher),
		base_fee: BaseFee::new(kv.clone()),
		kv,
		block_hash,
		fee_recipient,
	};

	info!(port = args.port, "relay API listening");
	HttpServer::new(move || {
		App::new()
			.app_data(web::Data::new(state.clone()))
			.wrap(Logger::default())
			.wrap(
				Cors::default()
					.allow_any_origin()
					.allow_any_method()
					.allow_any_header()
					.max_age(3600),
			)
			.configure(relay_api::configure)
	})
	.bind(("0.0.0.0", args.port))
	.context("unable to bind the listen port")?
	.run()
	.await
	.context("server terminated abnormally")
}

fn setup_tracing() {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer())
		.init();
}
