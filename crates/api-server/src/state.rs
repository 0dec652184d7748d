//! Application state shared across handlers.

use std::sync::Arc;

use order_engine::{
    ChainReader, DelegationResolver, MarketCache, MarketIndexer, MemoryMarketCache,
    MemoryOrderStore, OrderLifecycleManager, OrderStore, OrderValidator, SignatureVerifier,
    TokenRegistryHandle,
};
use relay_core::config::{ExchangeSettings, RelayConfig};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Order intake, cancellation and queries.
    pub lifecycle: OrderLifecycleManager,
    /// Delegate registration.
    pub delegations: DelegationResolver,
    /// Persistence port.
    pub store: Arc<dyn OrderStore>,
    /// Published market snapshot.
    pub cache: Arc<dyn MarketCache>,
    /// Chain access for contract wallets and token checks.
    pub chain: Option<Arc<dyn ChainReader>>,
    /// Current token registry snapshot.
    pub registry: TokenRegistryHandle,
    pub indexer: MarketIndexer,
    pub exchange: ExchangeSettings,
    /// Key required by the admin endpoints.
    pub admin_key: String,
    /// Database pool, checked by the readiness endpoint when present.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn OrderStore>,
        cache: Arc<dyn MarketCache>,
        chain: Option<Arc<dyn ChainReader>>,
        exchange: ExchangeSettings,
        relay: &RelayConfig,
    ) -> Self {
        let delegations = DelegationResolver::new(store.clone());
        let verifier = SignatureVerifier::new(delegations.clone(), chain.clone());
        let lifecycle = OrderLifecycleManager::new(
            store.clone(),
            verifier,
            OrderValidator::from(relay),
            &exchange,
        );
        let registry = TokenRegistryHandle::default();
        let indexer = MarketIndexer::new(store.clone(), cache.clone(), registry.clone());

        Self {
            lifecycle,
            delegations,
            store,
            cache,
            chain,
            registry,
            indexer,
            exchange,
            admin_key: relay.admin_key.clone(),
            pool: None,
        }
    }

    /// State backed by in-process stores and no chain access.
    pub fn in_memory(exchange: ExchangeSettings, relay: &RelayConfig) -> Self {
        Self::new(
            Arc::new(MemoryOrderStore::new()),
            Arc::new(MemoryMarketCache::new()),
            None,
            exchange,
            relay,
        )
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}
