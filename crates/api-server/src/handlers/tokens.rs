//! Token registry handlers.

use alloy_primitives::Address;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use order_engine::{read_active_markets, TokenRegistry};
use relay_core::types::TokenInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::required;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActiveTokensResponse {
    /// Tokens appearing in the published active markets.
    #[schema(value_type = Vec<String>)]
    pub tokens: Vec<Address>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TokenInfoQuery {
    /// Token address or symbol.
    pub token: Option<String>,
}

/// Registry entry by address, or by symbol when `token` is not an address.
pub(crate) fn lookup_token(registry: &TokenRegistry, token: &str) -> ApiResult<TokenInfo> {
    let found = match token.parse::<Address>() {
        Ok(address) => registry.get(&address).cloned(),
        Err(_) => registry.tokens().into_iter().find(|t| t.symbol == token),
    };
    found.ok_or_else(|| ApiError::BadRequest(format!("bad token {token}")))
}

/// Tokens traded in the active markets.
#[utoipa::path(
    get,
    path = "/v1/tokens",
    tag = "tokens",
    responses(
        (status = 200, description = "Active tokens", body = ActiveTokensResponse)
    )
)]
pub async fn active_tokens(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ActiveTokensResponse>> {
    let markets = read_active_markets(state.cache.as_ref()).await?;
    let tokens: BTreeSet<Address> = markets
        .iter()
        .flat_map(|m| [m.buy_token, m.sell_token])
        .collect();

    Ok(Json(ActiveTokensResponse {
        tokens: tokens.into_iter().collect(),
    }))
}

/// One registry entry.
#[utoipa::path(
    get,
    path = "/v1/tokens/info",
    tag = "tokens",
    params(TokenInfoQuery),
    responses(
        (status = 200, description = "Token info"),
        (status = 400, description = "Unknown token", body = crate::error::ErrorResponse)
    )
)]
pub async fn token_info(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenInfoQuery>, QueryRejection>,
) -> ApiResult<Json<TokenInfo>> {
    let Query(query) = query?;
    let token = required("token", &query.token)?;
    let registry = state.registry.snapshot().await;
    Ok(Json(lookup_token(&registry, token)?))
}
