//! Redis-backed key/value cache for published snapshots.

use crate::config::RedisConfig;
use crate::Result;
use redis::AsyncCommands;

/// Cache key holding the active-market snapshot.
pub const ACTIVE_MARKETS_KEY: &str = "activemarkets";

/// Thin wrapper over a managed Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    /// Connect using the configured URL.
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }
}
