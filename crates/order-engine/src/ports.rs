//! Ports the engine talks to: order persistence, the snapshot cache and the
//! chain.
//!
//! Implementations live in [`crate::adapters`] (Postgres, Redis, JSON-RPC)
//! and [`crate::memory`] (in-process, for tests and local runs).

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use relay_core::types::{OrderFilter, OrderRecord, TokenInfo, TokenMetadata};
use relay_core::Result;

/// Which amount a quote is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSide {
    /// The taker wants to receive this much of `buy_token`.
    Buy(U256),
    /// The taker wants to spend this much of `sell_token`.
    Sell(U256),
}

/// A taker's quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub buy_token: Address,
    pub sell_token: Address,
    pub side: QuoteSide,
}

/// Persistence port. Uniqueness of the order hash is enforced atomically.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Returns `false` if an order with the same hash already exists.
    async fn insert_order(&self, record: &OrderRecord) -> Result<bool>;

    async fn delete_by_hash_and_owner(&self, hash: &B256, owner: &Address) -> Result<bool>;

    async fn delete_by_hash_and_token(&self, hash: &B256, token: &str) -> Result<bool>;

    async fn query_by_filter(&self, filter: &OrderFilter) -> Result<Vec<OrderRecord>>;

    /// At most 25 orders.
    async fn get_orders(&self, hashes: &[B256]) -> Result<Vec<OrderRecord>>;

    /// Open orders of `user`, newest first, at most 25.
    async fn get_user_orders(&self, user: &Address) -> Result<Vec<OrderRecord>>;

    /// Cheapest maker orders covering the requested amount.
    async fn quote(&self, request: &QuoteRequest, now: u64) -> Result<Vec<OrderRecord>>;

    /// Delete every order expiring at or before `cutoff`; returns the count.
    async fn delete_expired(&self, cutoff: u64) -> Result<u64>;

    /// Distinct `(buy_token, sell_token)` among orders live at `now`.
    async fn list_distinct_pairs(&self, now: u64) -> Result<Vec<(Address, Address)>>;

    /// Owner the `signer` key is registered to act for.
    async fn lookup_delegation(&self, signer: &Address) -> Result<Option<Address>>;

    async fn register_delegation(&self, signer: &Address, owner: &Address) -> Result<()>;

    async fn list_tokens(&self) -> Result<Vec<TokenInfo>>;

    /// Returns `false` if the token address is already registered.
    async fn insert_token(&self, token: &TokenInfo) -> Result<bool>;
}

/// Cache port for published snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Read-only chain access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// EIP-1271 check against the contract at `contract`.
    async fn is_valid_signature(
        &self,
        contract: &Address,
        digest: &B256,
        signature: &[u8],
    ) -> Result<bool>;

    async fn token_metadata(&self, token: &Address) -> Result<TokenMetadata>;
}
