//! Token registry snapshot.
//!
//! Readers take an `Arc` to the current snapshot and never observe a partial
//! rebuild. The snapshot is replaced wholesale by the market indexer and after
//! a token is admitted.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use relay_core::types::TokenInfo;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{OrderError, Result};
use crate::ports::{ChainReader, OrderStore};

/// Immutable view of the admitted tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    tokens: HashMap<Address, TokenInfo>,
}

impl TokenRegistry {
    pub fn new(tokens: impl IntoIterator<Item = TokenInfo>) -> Self {
        Self {
            tokens: tokens.into_iter().map(|t| (t.address, t)).collect(),
        }
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.tokens.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<&TokenInfo> {
        self.tokens.get(address)
    }

    /// Admitted tokens sorted by symbol.
    pub fn tokens(&self) -> Vec<TokenInfo> {
        let mut tokens: Vec<TokenInfo> = self.tokens.values().cloned().collect();
        tokens.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Shared handle to the current [`TokenRegistry`] snapshot.
#[derive(Clone, Default)]
pub struct TokenRegistryHandle {
    current: Arc<RwLock<Arc<TokenRegistry>>>,
}

impl TokenRegistryHandle {
    pub fn new(registry: TokenRegistry) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    /// The last published snapshot.
    pub async fn snapshot(&self) -> Arc<TokenRegistry> {
        self.current.read().await.clone()
    }

    pub async fn replace(&self, registry: TokenRegistry) {
        *self.current.write().await = Arc::new(registry);
    }

    /// Rebuild the snapshot from the store.
    pub async fn rebuild(&self, store: &dyn OrderStore) -> Result<Arc<TokenRegistry>> {
        let registry = Arc::new(TokenRegistry::new(store.list_tokens().await?));
        *self.current.write().await = registry.clone();
        Ok(registry)
    }

    /// Admit a new token after the duplicate and on-chain checks, then
    /// rebuild the snapshot.
    pub async fn admit(
        &self,
        store: &dyn OrderStore,
        chain: Option<&dyn ChainReader>,
        token: TokenInfo,
    ) -> Result<()> {
        let existing = store.list_tokens().await?;
        if existing.iter().any(|t| t.address == token.address) {
            return Err(OrderError::Conflict("Token address is already used".into()));
        }
        if existing.iter().any(|t| t.symbol == token.symbol) {
            return Err(OrderError::Conflict("Token symbol is already used".into()));
        }
        if existing.iter().any(|t| t.name == token.name) {
            return Err(OrderError::Conflict("Token name is already used".into()));
        }

        match chain {
            Some(chain) => {
                let on_chain = chain.token_metadata(&token.address).await?;
                if let Some(mismatch) = token.mismatch(&on_chain) {
                    return Err(OrderError::Conflict(mismatch.into()));
                }
            }
            None => warn!(
                address = %token.address,
                "No chain reader configured, skipping on-chain token check"
            ),
        }

        if !store.insert_token(&token).await? {
            return Err(OrderError::Conflict("Token address is already used".into()));
        }
        info!(address = %token.address, symbol = %token.symbol, "Token admitted");

        self.rebuild(store).await?;
        Ok(())
    }

    /// Insert configured seed tokens that are not registered yet.
    pub async fn seed(&self, store: &dyn OrderStore, tokens: &[TokenInfo]) -> Result<usize> {
        let mut added = 0;
        for token in tokens {
            if store.insert_token(token).await? {
                added += 1;
            }
        }
        self.rebuild(store).await?;
        Ok(added)
    }
}
