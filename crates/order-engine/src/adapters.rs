//! Port implementations over the concrete relay-core clients.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use relay_core::api::ChainClient;
use relay_core::cache::RedisCache;
use relay_core::db::{DelegationRepository, OrderRepository, TokenRepository};
use relay_core::types::{OrderFilter, OrderRecord, TokenInfo, TokenMetadata};
use relay_core::Result;
use sqlx::PgPool;

use crate::book::{by_price, select_quote};
use crate::ports::{ChainReader, MarketCache, OrderStore, QuoteRequest};

/// Postgres-backed [`OrderStore`].
#[derive(Clone)]
pub struct PgStore {
    orders: OrderRepository,
    tokens: TokenRepository,
    delegations: DelegationRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            tokens: TokenRepository::new(pool.clone()),
            delegations: DelegationRepository::new(pool),
        }
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, record: &OrderRecord) -> Result<bool> {
        self.orders.insert(record).await
    }

    async fn delete_by_hash_and_owner(&self, hash: &B256, owner: &Address) -> Result<bool> {
        self.orders.delete_by_hash_and_owner(hash, owner).await
    }

    async fn delete_by_hash_and_token(&self, hash: &B256, token: &str) -> Result<bool> {
        self.orders.delete_by_hash_and_token(hash, token).await
    }

    async fn query_by_filter(&self, filter: &OrderFilter) -> Result<Vec<OrderRecord>> {
        let mut orders = self.orders.query_by_filter(filter).await?;
        orders.sort_by(by_price);
        Ok(orders)
    }

    async fn get_orders(&self, hashes: &[B256]) -> Result<Vec<OrderRecord>> {
        self.orders.get_by_hashes(hashes).await
    }

    async fn get_user_orders(&self, user: &Address) -> Result<Vec<OrderRecord>> {
        self.orders.get_user_orders(user).await
    }

    async fn quote(&self, request: &QuoteRequest, now: u64) -> Result<Vec<OrderRecord>> {
        // Makers sell what the taker buys.
        let candidates = self
            .orders
            .query_by_filter(&OrderFilter {
                buy_token: request.sell_token,
                sell_token: request.buy_token,
                expires_after: Some(now),
            })
            .await?;
        Ok(select_quote(candidates, &request.side))
    }

    async fn delete_expired(&self, cutoff: u64) -> Result<u64> {
        self.orders.delete_expired(cutoff).await
    }

    async fn list_distinct_pairs(&self, now: u64) -> Result<Vec<(Address, Address)>> {
        self.orders.distinct_pairs(now).await
    }

    async fn lookup_delegation(&self, signer: &Address) -> Result<Option<Address>> {
        self.delegations.lookup(signer).await
    }

    async fn register_delegation(&self, signer: &Address, owner: &Address) -> Result<()> {
        self.delegations.register(signer, owner).await
    }

    async fn list_tokens(&self) -> Result<Vec<TokenInfo>> {
        self.tokens.list().await
    }

    async fn insert_token(&self, token: &TokenInfo) -> Result<bool> {
        self.tokens.insert(token).await
    }
}

#[async_trait]
impl MarketCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        RedisCache::get(self, key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        RedisCache::set(self, key, value).await
    }
}

#[async_trait]
impl ChainReader for ChainClient {
    async fn is_valid_signature(
        &self,
        contract: &Address,
        digest: &B256,
        signature: &[u8],
    ) -> Result<bool> {
        ChainClient::is_valid_signature(self, *contract, *digest, signature).await
    }

    async fn token_metadata(&self, token: &Address) -> Result<TokenMetadata> {
        ChainClient::token_metadata(self, *token).await
    }
}
