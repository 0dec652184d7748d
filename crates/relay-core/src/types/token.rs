//! Token registry entries.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A curated token known to the relay. Immutable once admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// Metadata read from a token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    /// Compare against on-chain metadata, returning the first mismatch.
    pub fn mismatch(&self, on_chain: &TokenMetadata) -> Option<&'static str> {
        if self.name != on_chain.name {
            Some("Token name does not match on chain name")
        } else if self.symbol != on_chain.symbol {
            Some("Token symbol does not match on chain symbol")
        } else if self.decimals != on_chain.decimals {
            Some("Token decimals does not match on chain decimals")
        } else {
            None
        }
    }
}
