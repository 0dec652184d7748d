//! API Server binary entrypoint.

use std::sync::Arc;

use api_server::{ApiServer, AppState, ServerConfig};
use order_engine::{ChainReader, PgStore};
use relay_core::api::ChainClient;
use relay_core::cache::RedisCache;
use relay_core::config::Config;
use relay_core::db;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api_server=debug,order_engine=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database).await?;

    // Run migrations (can be disabled via SKIP_MIGRATIONS=true for manual migration management)
    let skip_migrations = std::env::var("SKIP_MIGRATIONS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    if !skip_migrations {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;
    } else {
        tracing::info!("Skipping migrations (SKIP_MIGRATIONS=true)");
    }

    let cache = RedisCache::connect(&config.redis).await?;
    let chain: Option<Arc<dyn ChainReader>> = match &config.chain.rpc_url {
        Some(url) => Some(Arc::new(ChainClient::new(url.clone()))),
        None => {
            tracing::warn!("CHAIN_RPC_URL not set, contract-wallet signatures are not accepted");
            None
        }
    };

    let state = AppState::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(cache),
        chain,
        config.exchange.clone(),
        &config.relay,
    )
    .with_pool(pool);

    let seeded = state
        .registry
        .seed(state.store.as_ref(), &config.exchange.tokens)
        .await?;
    tracing::info!(
        seeded,
        chain_id = config.exchange.chain_id,
        exchange = %config.exchange.exchange_address,
        "Token registry loaded"
    );

    let server = ApiServer::new(ServerConfig::from_env(), state, config.relay);
    server.run().await?;

    Ok(())
}
