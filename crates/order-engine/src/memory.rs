//! In-process port implementations for tests and local runs.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use relay_core::types::{OrderFilter, OrderRecord, TokenInfo};
use relay_core::Result;
use tokio::sync::RwLock;

use crate::book::{by_price, select_quote};
use crate::ports::{MarketCache, OrderStore, QuoteRequest};

/// Row limit of id and per-user lookups.
const LOOKUP_LIMIT: usize = 25;

/// In-memory [`OrderStore`]. The hash-uniqueness check and the insert happen
/// under one write lock.
#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<HashMap<B256, OrderRecord>>>,
    delegations: Arc<RwLock<HashMap<Address, Address>>>,
    tokens: Arc<RwLock<Vec<TokenInfo>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    pub async fn contains(&self, hash: &B256) -> bool {
        self.orders.read().await.contains_key(hash)
    }

    /// Overwrite the remaining amount of an order, as a settlement reporter
    /// would.
    pub async fn set_unfilled(&self, hash: &B256, unfilled: U256) -> bool {
        match self.orders.write().await.get_mut(hash) {
            Some(record) => {
                record.unfilled = unfilled;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert_order(&self, record: &OrderRecord) -> Result<bool> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&record.hash) {
            return Ok(false);
        }
        orders.insert(record.hash, record.clone());
        Ok(true)
    }

    async fn delete_by_hash_and_owner(&self, hash: &B256, owner: &Address) -> Result<bool> {
        let mut orders = self.orders.write().await;
        match orders.get(hash) {
            Some(record) if record.order.user == *owner => {
                orders.remove(hash);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_by_hash_and_token(&self, hash: &B256, token: &str) -> Result<bool> {
        let mut orders = self.orders.write().await;
        match orders.get(hash) {
            Some(record) if record.cancel_token == token => {
                orders.remove(hash);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn query_by_filter(&self, filter: &OrderFilter) -> Result<Vec<OrderRecord>> {
        let orders = self.orders.read().await;
        let mut matched: Vec<OrderRecord> = orders
            .values()
            .filter(|r| {
                r.order.buy_token == filter.buy_token
                    && r.order.sell_token == filter.sell_token
                    && r.is_open()
                    && filter
                        .expires_after
                        .map_or(true, |after| r.order.expiration_time_seconds > after)
            })
            .cloned()
            .collect();
        matched.sort_by(by_price);
        Ok(matched)
    }

    async fn get_orders(&self, hashes: &[B256]) -> Result<Vec<OrderRecord>> {
        let orders = self.orders.read().await;
        Ok(hashes
            .iter()
            .filter_map(|hash| orders.get(hash).cloned())
            .take(LOOKUP_LIMIT)
            .collect())
    }

    async fn get_user_orders(&self, user: &Address) -> Result<Vec<OrderRecord>> {
        let orders = self.orders.read().await;
        let mut matched: Vec<OrderRecord> = orders
            .values()
            .filter(|r| r.order.user == *user && r.is_open())
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(LOOKUP_LIMIT);
        Ok(matched)
    }

    async fn quote(&self, request: &QuoteRequest, now: u64) -> Result<Vec<OrderRecord>> {
        let orders = self.orders.read().await;
        // Makers sell what the taker buys.
        let candidates = orders
            .values()
            .filter(|r| {
                r.order.sell_token == request.buy_token
                    && r.order.buy_token == request.sell_token
                    && r.is_open()
                    && !r.order.is_expired_at(now)
            })
            .cloned()
            .collect();
        Ok(select_quote(candidates, &request.side))
    }

    async fn delete_expired(&self, cutoff: u64) -> Result<u64> {
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|_, r| r.order.expiration_time_seconds > cutoff);
        Ok((before - orders.len()) as u64)
    }

    async fn list_distinct_pairs(&self, now: u64) -> Result<Vec<(Address, Address)>> {
        let orders = self.orders.read().await;
        let pairs: BTreeSet<(Address, Address)> = orders
            .values()
            .filter(|r| !r.order.is_expired_at(now))
            .map(|r| (r.order.buy_token, r.order.sell_token))
            .collect();
        Ok(pairs.into_iter().collect())
    }

    async fn lookup_delegation(&self, signer: &Address) -> Result<Option<Address>> {
        Ok(self.delegations.read().await.get(signer).copied())
    }

    async fn register_delegation(&self, signer: &Address, owner: &Address) -> Result<()> {
        self.delegations.write().await.insert(*signer, *owner);
        Ok(())
    }

    async fn list_tokens(&self) -> Result<Vec<TokenInfo>> {
        Ok(self.tokens.read().await.clone())
    }

    async fn insert_token(&self, token: &TokenInfo) -> Result<bool> {
        let mut tokens = self.tokens.write().await;
        if tokens.iter().any(|t| t.address == token.address) {
            return Ok(false);
        }
        tokens.push(token.clone());
        Ok(true)
    }
}

/// In-memory [`MarketCache`].
#[derive(Clone, Default)]
pub struct MemoryMarketCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryMarketCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketCache for MemoryMarketCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
