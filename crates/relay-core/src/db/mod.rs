//! Database access layer for PostgreSQL.

pub mod delegations;
pub mod orders;
pub mod tokens;

pub use delegations::DelegationRepository;
pub use orders::OrderRepository;
pub use tokens::TokenRepository;

use crate::config::DatabaseConfig;
use crate::{Error, Result};
use alloy_primitives::{Address, U256};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    Ok(pool)
}

/// Run the embedded migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Addresses are stored as lowercase `0x` hex.
pub(crate) fn address_text(address: &Address) -> String {
    format!("{:#x}", address)
}

pub(crate) fn parse_address(text: &str) -> Result<Address> {
    text.parse()
        .map_err(|_| Error::corrupt(format!("invalid stored address {text}")))
}

/// Amounts are stored as NUMERIC and read back through a `::text` cast.
pub(crate) fn parse_amount(text: &str) -> Result<U256> {
    crate::types::u256_decimal::parse(text)
        .ok_or_else(|| Error::corrupt(format!("invalid stored amount {text}")))
}
