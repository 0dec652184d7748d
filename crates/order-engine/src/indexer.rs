//! Active-market indexing.
//!
//! Each tick rebuilds the token registry snapshot, derives the distinct
//! pairs of the live orders and publishes them to the cache under
//! [`ACTIVE_MARKETS_KEY`]. The indexer is the only writer of that key.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::cache::ACTIVE_MARKETS_KEY;
use relay_core::types::MarketPair;
use tracing::{debug, info};

use crate::error::Result;
use crate::periodic::PeriodicJob;
use crate::ports::{MarketCache, OrderStore};
use crate::registry::{TokenRegistry, TokenRegistryHandle};
use crate::unix_now;

#[derive(Clone)]
pub struct MarketIndexer {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn MarketCache>,
    registry: TokenRegistryHandle,
}

impl MarketIndexer {
    pub fn new(
        store: Arc<dyn OrderStore>,
        cache: Arc<dyn MarketCache>,
        registry: TokenRegistryHandle,
    ) -> Self {
        Self {
            store,
            cache,
            registry,
        }
    }

    /// Distinct pairs live at `now`, flagged against a freshly rebuilt
    /// registry. Nothing is published.
    pub async fn compute_at(&self, now: u64) -> Result<Vec<MarketPair>> {
        let registry = self.registry.rebuild(self.store.as_ref()).await?;
        self.pairs_at(&registry, now).await
    }

    /// Distinct pairs live at `now`, flagged against `registry`. Leaves the
    /// shared snapshot untouched.
    pub async fn pairs_at(&self, registry: &TokenRegistry, now: u64) -> Result<Vec<MarketPair>> {
        let pairs = self.store.list_distinct_pairs(now).await?;

        Ok(pairs
            .into_iter()
            .map(|(buy_token, sell_token)| MarketPair {
                buy_token,
                sell_token,
                verified: registry.contains(&buy_token) && registry.contains(&sell_token),
            })
            .collect())
    }

    /// Compute and publish the snapshot as of `now`.
    pub async fn index_at(&self, now: u64) -> Result<Vec<MarketPair>> {
        let markets = self.compute_at(now).await?;
        let payload = serde_json::to_string(&markets).map_err(relay_core::Error::from)?;
        self.cache.set(ACTIVE_MARKETS_KEY, &payload).await?;

        let verified = markets.iter().filter(|m| m.verified).count();
        info!(markets = markets.len(), verified, "Published active markets");
        Ok(markets)
    }
}

#[async_trait]
impl PeriodicJob for MarketIndexer {
    fn name(&self) -> &'static str {
        "market_indexer"
    }

    async fn tick(&self) -> Result<()> {
        self.index_at(unix_now()).await.map(|_| ())
    }
}

/// The last published snapshot; empty before the first publish.
pub async fn read_active_markets(cache: &dyn MarketCache) -> Result<Vec<MarketPair>> {
    match cache.get(ACTIVE_MARKETS_KEY).await? {
        Some(payload) => {
            let markets = serde_json::from_str(&payload).map_err(relay_core::Error::from)?;
            Ok(markets)
        }
        None => {
            debug!("No active markets published yet");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrderError;
    use crate::memory::{MemoryMarketCache, MemoryOrderStore};
    use crate::ports::MockMarketCache;
    use alloy_primitives::{Address, B256, U256};
    use relay_core::types::{Order, OrderRecord, TokenInfo};

    const NOW: u64 = 1_700_000_000;

    fn token(byte: u8, symbol: &str) -> TokenInfo {
        TokenInfo {
            address: Address::repeat_byte(byte),
            symbol: symbol.into(),
            name: format!("{symbol} token"),
            decimals: 18,
        }
    }

    fn record(hash: u8, buy: u8, sell: u8, expires: u64) -> OrderRecord {
        let order = Order {
            user: Address::repeat_byte(0x11),
            buy_token: Address::repeat_byte(buy),
            sell_token: Address::repeat_byte(sell),
            buy_amount: U256::from(1u64),
            sell_amount: U256::from(1u64),
            expiration_time_seconds: expires,
        };
        OrderRecord::new(B256::repeat_byte(hash), order, "0x".into(), "t".into())
    }

    async fn setup() -> (Arc<MemoryOrderStore>, Arc<MemoryMarketCache>, MarketIndexer) {
        let store = Arc::new(MemoryOrderStore::new());
        let cache = Arc::new(MemoryMarketCache::new());
        let indexer = MarketIndexer::new(
            store.clone(),
            cache.clone(),
            TokenRegistryHandle::default(),
        );
        (store, cache, indexer)
    }

    #[tokio::test]
    async fn test_both_directions_are_separate_markets() {
        let (store, cache, indexer) = setup().await;
        store.insert_token(&token(0xa, "AAA")).await.unwrap();
        store.insert_token(&token(0xb, "BBB")).await.unwrap();
        store.insert_order(&record(1, 0xa, 0xb, NOW + 60)).await.unwrap();
        store.insert_order(&record(2, 0xb, 0xa, NOW + 60)).await.unwrap();
        store.insert_order(&record(3, 0xb, 0xc, NOW + 60)).await.unwrap();

        indexer.index_at(NOW).await.unwrap();
        let markets = read_active_markets(cache.as_ref()).await.unwrap();

        assert_eq!(markets.len(), 3);
        let find = |buy: u8, sell: u8| {
            markets
                .iter()
                .find(|m| {
                    m.buy_token == Address::repeat_byte(buy)
                        && m.sell_token == Address::repeat_byte(sell)
                })
                .cloned()
                .unwrap()
        };
        assert!(find(0xa, 0xb).verified);
        assert!(find(0xb, 0xa).verified);
        assert!(!find(0xb, 0xc).verified);
    }

    #[tokio::test]
    async fn test_expired_orders_do_not_form_markets() {
        let (store, _cache, indexer) = setup().await;
        store.insert_order(&record(1, 0xa, 0xb, NOW)).await.unwrap();
        store.insert_order(&record(2, 0xa, 0xb, NOW - 10)).await.unwrap();

        assert!(indexer.index_at(NOW).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registry_snapshot_is_rebuilt() {
        let (store, _cache, indexer) = setup().await;
        store.insert_token(&token(0xa, "AAA")).await.unwrap();

        indexer.index_at(NOW).await.unwrap();
        assert!(indexer
            .registry
            .snapshot()
            .await
            .contains(&Address::repeat_byte(0xa)));
    }

    #[tokio::test]
    async fn test_pairs_at_leaves_snapshot_alone() {
        let (store, _cache, indexer) = setup().await;
        store.insert_token(&token(0xa, "AAA")).await.unwrap();
        store.insert_order(&record(1, 0xa, 0xb, NOW + 60)).await.unwrap();

        let snapshot = indexer.registry.snapshot().await;
        let pairs = indexer.pairs_at(&snapshot, NOW).await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(!pairs[0].verified);
        assert!(indexer.registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_read_before_first_publish_is_empty() {
        let cache = MemoryMarketCache::new();
        assert!(read_active_markets(&cache).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_failure_surfaces_as_store_error() {
        let mut cache = MockMarketCache::new();
        cache.expect_set().returning(|_, _| {
            Err(relay_core::Error::Config {
                message: "redis down".into(),
            })
        });
        let indexer = MarketIndexer::new(
            Arc::new(MemoryOrderStore::new()),
            Arc::new(cache),
            TokenRegistryHandle::default(),
        );

        let err = indexer.index_at(NOW).await.unwrap_err();
        assert!(matches!(err, OrderError::Store(_)));
    }
}
