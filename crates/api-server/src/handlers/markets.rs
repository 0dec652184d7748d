//! Market handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use order_engine::{read_active_markets, unix_now};
use relay_core::config::ExchangeSettings;
use relay_core::types::{MarketInfo, MarketPair, TokenInfo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::required;
use super::tokens::lookup_token;
use crate::error::ApiResult;
use crate::state::AppState;

/// Published active markets.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketsResponse {
    #[schema(value_type = Vec<Object>)]
    pub markets: Vec<MarketPair>,
    /// Registry tokens, sorted by symbol.
    #[schema(value_type = Vec<Object>)]
    pub verified_tokens: Vec<TokenInfo>,
}

/// Markets computed from the store, plus the exchange settings.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayInfoResponse {
    #[schema(value_type = Vec<Object>)]
    pub markets: Vec<MarketPair>,
    #[schema(value_type = Vec<Object>)]
    pub verified_tokens: Vec<TokenInfo>,
    #[schema(value_type = Object)]
    pub exchange: ExchangeSettings,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct MarketInfoQuery {
    /// Address or symbol.
    pub buy_token: Option<String>,
    /// Address or symbol.
    pub sell_token: Option<String>,
}

/// Last published market snapshot.
#[utoipa::path(
    get,
    path = "/v1/markets",
    tag = "markets",
    responses(
        (status = 200, description = "Active markets", body = MarketsResponse)
    )
)]
pub async fn list_markets(State(state): State<Arc<AppState>>) -> ApiResult<Json<MarketsResponse>> {
    let markets = read_active_markets(state.cache.as_ref()).await?;
    let verified_tokens = state.registry.snapshot().await.tokens();
    Ok(Json(MarketsResponse {
        markets,
        verified_tokens,
    }))
}

/// Both legs of a market and the exchange it settles on.
#[utoipa::path(
    get,
    path = "/v1/markets/info",
    tag = "markets",
    params(MarketInfoQuery),
    responses(
        (status = 200, description = "Market info"),
        (status = 400, description = "Unknown token", body = crate::error::ErrorResponse)
    )
)]
pub async fn market_info(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MarketInfoQuery>, QueryRejection>,
) -> ApiResult<Json<MarketInfo>> {
    let Query(query) = query?;
    let buy_token = required("buyToken", &query.buy_token)?;
    let sell_token = required("sellToken", &query.sell_token)?;

    let registry = state.registry.snapshot().await;
    Ok(Json(MarketInfo {
        buy_token: lookup_token(&registry, buy_token)?,
        sell_token: lookup_token(&registry, sell_token)?,
        exchange_address: state.exchange.exchange_address,
        contract_version: state.exchange.domain.version.clone(),
    }))
}

/// Relay overview. Pairs come straight from the store and are flagged
/// against the current registry snapshot.
#[utoipa::path(
    get,
    path = "/v1/info",
    tag = "markets",
    responses(
        (status = 200, description = "Relay info", body = RelayInfoResponse)
    )
)]
pub async fn relay_info(State(state): State<Arc<AppState>>) -> ApiResult<Json<RelayInfoResponse>> {
    let registry = state.registry.snapshot().await;
    let markets = state.indexer.pairs_at(&registry, unix_now()).await?;
    let verified_tokens = registry.tokens();
    Ok(Json(RelayInfoResponse {
        markets,
        verified_tokens,
        exchange: state.exchange.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{app, order_for, send, signed_submission, TOKEN_A, TOKEN_B};
    use super::*;
    use auth::RelayWallet;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn token(address: alloy_primitives::Address, symbol: &str) -> TokenInfo {
        TokenInfo {
            address,
            symbol: symbol.into(),
            name: format!("{symbol} Token"),
            decimals: 18,
        }
    }

    #[tokio::test]
    async fn test_markets_follow_published_snapshot() {
        let (router, state) = app();
        state
            .registry
            .seed(state.store.as_ref(), &[token(TOKEN_A, "AAA")])
            .await
            .unwrap();

        let wallet = RelayWallet::random();
        let body = signed_submission(&state, &wallet, &order_for(wallet.address(), 10, 5)).await;
        send(&router, Method::POST, "/v1/order", Some(body)).await;

        let (_, before) = send(&router, Method::GET, "/v1/markets", None).await;
        assert_eq!(before["markets"], json!([]));
        assert_eq!(before["verifiedTokens"][0]["symbol"], json!("AAA"));

        state.indexer.index_at(unix_now()).await.unwrap();
        let (status, after) = send(&router, Method::GET, "/v1/markets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(after["markets"].as_array().unwrap().len(), 1);
        assert_eq!(after["markets"][0]["verified"], json!(false));

        let (_, tokens) = send(&router, Method::GET, "/v1/tokens", None).await;
        assert_eq!(tokens["tokens"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_info_reads_store_directly() {
        let (router, state) = app();
        state
            .registry
            .seed(
                state.store.as_ref(),
                &[token(TOKEN_A, "AAA"), token(TOKEN_B, "BBB")],
            )
            .await
            .unwrap();
        let wallet = RelayWallet::random();
        let body = signed_submission(&state, &wallet, &order_for(wallet.address(), 10, 5)).await;
        send(&router, Method::POST, "/v1/order", Some(body)).await;

        let (status, info) = send(&router, Method::GET, "/v1/info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(info["markets"][0]["verified"], json!(true));
        assert_eq!(info["exchange"]["chainId"], json!(1));
    }

    #[tokio::test]
    async fn test_info_does_not_refresh_registry() {
        let (router, state) = app();
        let wallet = RelayWallet::random();
        let body = signed_submission(&state, &wallet, &order_for(wallet.address(), 10, 5)).await;
        send(&router, Method::POST, "/v1/order", Some(body)).await;

        // admitted behind the registry's back; only the indexer cycle picks it up
        state.store.insert_token(&token(TOKEN_A, "AAA")).await.unwrap();
        state.store.insert_token(&token(TOKEN_B, "BBB")).await.unwrap();

        let (status, info) = send(&router, Method::GET, "/v1/info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(info["markets"][0]["verified"], json!(false));
        assert_eq!(info["verifiedTokens"], json!([]));
        assert!(state.registry.snapshot().await.is_empty());

        state.indexer.index_at(unix_now()).await.unwrap();
        let (_, info) = send(&router, Method::GET, "/v1/info", None).await;
        assert_eq!(info["markets"][0]["verified"], json!(true));
    }

    #[tokio::test]
    async fn test_market_info() {
        let (router, state) = app();
        state
            .registry
            .seed(
                state.store.as_ref(),
                &[token(TOKEN_A, "AAA"), token(TOKEN_B, "BBB")],
            )
            .await
            .unwrap();

        let (status, info) = send(
            &router,
            Method::GET,
            "/v1/markets/info?buyToken=AAA&sellToken=BBB",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(info["buyToken"]["symbol"], json!("AAA"));
        assert_eq!(info["contractVersion"], json!("1"));

        let (_, err) = send(&router, Method::GET, "/v1/markets/info?buyToken=AAA", None).await;
        assert_eq!(err["err"], json!("Missing sellToken"));
    }
}
