//! Error types for the order relay.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Typed data error: {message}")]
    TypedData { message: String },

    #[error("Chain RPC error: {message}")]
    Rpc { message: String },

    #[error("Corrupt stored value: {message}")]
    Corrupt { message: String },
}

impl Error {
    pub(crate) fn typed_data(message: impl Into<String>) -> Self {
        Error::TypedData {
            message: message.into(),
        }
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Error::Corrupt {
            message: message.into(),
        }
    }

    /// Short failure class that is safe to show to API clients.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Database(_) | Error::Migration(_) => "storage unavailable",
            Error::Redis(_) => "cache unavailable",
            Error::Http(_) | Error::Rpc { .. } => "chain node unavailable",
            Error::Json(_) | Error::Corrupt { .. } => "stored data unreadable",
            Error::ConfigFile(_) | Error::Config { .. } | Error::TypedData { .. } => {
                "relay misconfigured"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
