//! Configuration management for the order relay.

use crate::signing::{default_order_types, Eip712Domain, TypedDataTypes, TypedField};
use crate::types::TokenInfo;
use crate::{Error, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub chain: ChainConfig,
    pub relay: RelayConfig,
    pub exchange: ExchangeSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint used for contract-wallet signatures and token
    /// metadata checks. Both are skipped when unset.
    pub rpc_url: Option<String>,
}

/// Order-intake and background-job settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub min_expiry_window_secs: u64,
    pub max_expiry_window_secs: u64,
    pub sweep_interval_secs: u64,
    pub sweep_grace_secs: u64,
    pub market_index_interval_secs: u64,
    /// Key for the admin endpoints. Empty disables them.
    pub admin_key: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            min_expiry_window_secs: 5,
            max_expiry_window_secs: 31_536_000,
            sweep_interval_secs: 2,
            sweep_grace_secs: 3,
            market_index_interval_secs: 60,
            admin_key: String::new(),
        }
    }
}

impl RelayConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn market_index_interval(&self) -> Duration {
        Duration::from_secs(self.market_index_interval_secs)
    }

    /// Orders must outlive the sweep grace window, otherwise an order could
    /// be accepted and swept on the next tick.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.min_expiry_window_secs <= self.sweep_grace_secs {
            return Err(Error::Config {
                message: format!(
                    "MIN_EXPIRY_WINDOW_SECS ({}) must exceed SWEEP_GRACE_SECS ({})",
                    self.min_expiry_window_secs, self.sweep_grace_secs
                ),
            });
        }
        if self.max_expiry_window_secs <= self.min_expiry_window_secs {
            return Err(Error::Config {
                message: format!(
                    "MAX_EXPIRY_WINDOW_SECS ({}) must exceed MIN_EXPIRY_WINDOW_SECS ({})",
                    self.max_expiry_window_secs, self.min_expiry_window_secs
                ),
            });
        }
        if self.sweep_interval_secs == 0 || self.market_index_interval_secs == 0 {
            return Err(Error::Config {
                message: "background job intervals must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// On-chain settings of the exchange the relay serves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSettings {
    pub chain_id: u64,
    pub exchange_address: Address,
    pub domain: Eip712Domain,
    pub types: TypedDataTypes,
    /// Tokens admitted to the registry at startup.
    #[serde(skip)]
    pub tokens: Vec<TokenInfo>,
}

/// File layout of the exchange settings. Keys are snake_case so they survive
/// the `config` crate's key handling; struct names live in values.
#[derive(Debug, Deserialize)]
struct ExchangeSettingsFile {
    chain_id: u64,
    exchange_address: Address,
    domain: Eip712Domain,
    #[serde(default)]
    types: Vec<TypedStructFile>,
    #[serde(default)]
    tokens: Vec<TokenInfo>,
}

#[derive(Debug, Deserialize)]
struct TypedStructFile {
    name: String,
    fields: Vec<TypedField>,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        let chain_id = 1;
        Self {
            chain_id,
            exchange_address: Address::ZERO,
            domain: Eip712Domain::custom("Exchange", "1", chain_id, Address::ZERO),
            types: default_order_types(),
            tokens: Vec::new(),
        }
    }
}

impl ExchangeSettings {
    /// Load from a TOML or JSON file (format picked from the extension).
    pub fn from_file(path: &str) -> Result<Self> {
        let file: ExchangeSettingsFile = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize()?;

        if file.domain.chain_id != file.chain_id {
            return Err(Error::Config {
                message: format!(
                    "{path}: chain_id ({}) differs from domain.chain_id ({})",
                    file.chain_id, file.domain.chain_id
                ),
            });
        }

        let types = if file.types.is_empty() {
            default_order_types()
        } else {
            file.types
                .into_iter()
                .map(|s| (s.name, s.fields))
                .collect()
        };

        Ok(Self {
            chain_id: file.chain_id,
            exchange_address: file.exchange_address,
            domain: file.domain,
            types,
            tokens: file.tokens,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[allow(clippy::result_large_err)]
fn required_admin_key(value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(Error::Config {
            message: "ADMIN_KEY environment variable not set".to_string(),
        }),
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = RelayConfig::default();
        let relay = RelayConfig {
            min_expiry_window_secs: env_or("MIN_EXPIRY_WINDOW_SECS", defaults.min_expiry_window_secs),
            max_expiry_window_secs: env_or("MAX_EXPIRY_WINDOW_SECS", defaults.max_expiry_window_secs),
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs),
            sweep_grace_secs: env_or("SWEEP_GRACE_SECS", defaults.sweep_grace_secs),
            market_index_interval_secs: env_or(
                "MARKET_INDEX_INTERVAL_SECS",
                defaults.market_index_interval_secs,
            ),
            admin_key: required_admin_key(env::var("ADMIN_KEY").ok())?,
        };
        relay.validate()?;

        let exchange = match env::var("EXCHANGE_CONFIG_PATH") {
            Ok(path) => ExchangeSettings::from_file(&path)?,
            Err(_) => {
                tracing::warn!("EXCHANGE_CONFIG_PATH not set, using default exchange settings");
                ExchangeSettings::default()
            }
        };

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| Error::Config {
                    message: "DATABASE_URL environment variable not set".to_string(),
                })?,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            },
            chain: ChainConfig {
                rpc_url: env::var("CHAIN_RPC_URL").ok(),
            },
            relay,
            exchange,
        })
    }

    /// Configuration for tests (with defaults).
    pub fn test_config() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgres://localhost/order_relay_test".to_string(),
                max_connections: 2,
            },
            redis: RedisConfig {
                url: "redis://127.0.0.1:6379".to_string(),
            },
            chain: ChainConfig::default(),
            relay: RelayConfig::default(),
            exchange: ExchangeSettings::default(),
        }
    }
}
