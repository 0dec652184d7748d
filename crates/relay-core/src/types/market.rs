//! Market (trading pair) types.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use super::TokenInfo;

/// A directed trading pair derived from the open orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPair {
    pub buy_token: Address,
    pub sell_token: Address,
    /// Both legs are in the token registry.
    pub verified: bool,
}

impl MarketPair {
    /// Market id in `buy-sell` form with lowercase addresses.
    pub fn market_id(&self) -> String {
        format!("{:#x}-{:#x}", self.buy_token, self.sell_token)
    }
}

/// Both legs of a market plus the exchange they settle on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInfo {
    pub buy_token: TokenInfo,
    pub sell_token: TokenInfo,
    pub exchange_address: Address,
    pub contract_version: String,
}

/// Split a `A-B` or `A_B` pair string into its two token addresses.
pub fn parse_pair(tokens: &str) -> Option<(Address, Address)> {
    let (a, b) = tokens.split_once('-').or_else(|| tokens.split_once('_'))?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}
