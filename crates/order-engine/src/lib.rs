//! Order Engine
//!
//! Order intake, signature verification, delegation, and the background jobs
//! that expire orders and index active markets.

pub mod adapters;
pub mod book;
pub mod delegation;
pub mod error;
pub mod indexer;
pub mod lifecycle;
pub mod memory;
pub mod periodic;
pub mod ports;
pub mod registry;
pub mod sweeper;
pub mod validator;
pub mod verifier;

pub use adapters::PgStore;
pub use book::{by_price, select_quote};
pub use delegation::DelegationResolver;
pub use error::{OrderError, Result, ValidationError};
pub use indexer::{read_active_markets, MarketIndexer};
pub use lifecycle::{parse_order_id, OrderLifecycleManager};
pub use memory::{MemoryMarketCache, MemoryOrderStore};
pub use periodic::{spawn_periodic, PeriodicJob};
pub use ports::{ChainReader, MarketCache, OrderStore, QuoteRequest, QuoteSide};
pub use registry::{TokenRegistry, TokenRegistryHandle};
pub use sweeper::ExpirySweeper;
pub use validator::{OrderValidator, ValidatedOrder};
pub use verifier::SignatureVerifier;

/// Current time in seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
