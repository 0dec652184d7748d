//! Order submission, cancellation and query handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use order_engine::OrderError;
use relay_core::types::{
    parse_pair, render_hash, OrderFilter, OrderPayload, OrderRecord, SubmittedOrder,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use super::{address, amount, flag, required, required_address, OneOrMany};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request to submit a signed order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitOrderRequest {
    /// The order. May carry `signature` and `signer` itself.
    #[schema(value_type = Object)]
    pub order: Option<OrderPayload>,
    /// 65-byte hex signature over the order's typed-data digest.
    pub signature: Option<String>,
    /// Delegate key that produced the signature, if not the user.
    pub signer: Option<String>,
}

/// Accepted submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderResponse {
    /// Order hash, also the order id.
    pub hash: String,
    /// Bearer token for `/v1/order/cancelwithtoken`.
    pub cancel_token: String,
}

impl From<SubmittedOrder> for SubmitOrderResponse {
    fn from(submitted: SubmittedOrder) -> Self {
        Self {
            hash: render_hash(&submitted.hash),
            cancel_token: submitted.cancel_token,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrdersResponse {
    #[schema(value_type = Vec<Object>)]
    pub orders: Vec<OrderRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    /// Best-priced orders covering the requested amount.
    #[schema(value_type = Vec<Object>)]
    pub quote: Vec<OrderRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderBookResponse {
    /// The requested side, followed by the opposite side when `both` is set.
    #[schema(value_type = Object)]
    pub orderbook: Vec<Vec<OrderRecord>>,
}

/// Cancellation by signature: one `[owner, orderId, signature]` or a list.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelRequest {
    #[schema(value_type = Object)]
    pub cancel: Option<OneOrMany<(String, String, String)>>,
}

/// Cancellation by token: one `[orderId, cancelToken]` or a list.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelWithTokenRequest {
    #[schema(value_type = Object)]
    pub cancel: Option<OneOrMany<(String, String)>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelResponse {
    /// Ids of the removed orders.
    pub cancelled: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    pub buy_token: Option<String>,
    pub sell_token: Option<String>,
    /// Only orders expiring after this unix time.
    pub expires: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdsQuery {
    /// Comma-separated order ids.
    pub id_list: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub buy_token: Option<String>,
    pub sell_token: Option<String>,
    pub buy_amount: Option<String>,
    pub sell_amount: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderBookQuery {
    /// Include the opposite side.
    pub both: Option<String>,
}

/// Message of one failed batch entry; relay-side failures are logged.
fn entry_failure(id: &str, e: OrderError) -> String {
    if !e.is_client_error() {
        error!(order_id = %id, error = %e, "Cancellation failed");
    }
    format!(
        "Failed to cancel order {id}: {}",
        ApiError::from(e).client_message()
    )
}

/// Submit a signed order.
#[utoipa::path(
    post,
    path = "/v1/order",
    tag = "orders",
    request_body = SubmitOrderRequest,
    responses(
        (status = 200, description = "Order accepted", body = SubmitOrderResponse),
        (status = 400, description = "Order rejected", body = crate::error::ErrorResponse)
    )
)]
pub async fn submit_order(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitOrderRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitOrderResponse>> {
    let Json(request) = payload?;
    let order = request.order.ok_or(ApiError::Missing("order"))?;

    let submitted = state
        .lifecycle
        .submit(
            &order,
            request.signature.as_deref(),
            request.signer.as_deref(),
        )
        .await?;
    Ok(Json(submitted.into()))
}

/// Open orders of a pair, best price first.
#[utoipa::path(
    get,
    path = "/v1/orders",
    tag = "orders",
    params(OrdersQuery),
    responses(
        (status = 200, description = "Matching orders", body = OrdersResponse),
        (status = 400, description = "Bad query", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    query: Result<Query<OrdersQuery>, QueryRejection>,
) -> ApiResult<Json<OrdersResponse>> {
    let Query(query) = query?;
    let expires_after = match query.expires.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(v) => Some(
            v.parse()
                .map_err(|_| ApiError::BadRequest("expires must be a unix timestamp".into()))?,
        ),
    };
    let filter = OrderFilter {
        buy_token: required_address("buyToken", &query.buy_token)?,
        sell_token: required_address("sellToken", &query.sell_token)?,
        expires_after,
    };

    let orders = state.lifecycle.orders(&filter).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// Orders by id.
#[utoipa::path(
    get,
    path = "/v1/order",
    tag = "orders",
    params(OrderIdsQuery),
    responses(
        (status = 200, description = "Orders found", body = OrdersResponse),
        (status = 400, description = "No such order", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_orders(
    State(state): State<Arc<AppState>>,
    query: Result<Query<OrderIdsQuery>, QueryRejection>,
) -> ApiResult<Json<OrdersResponse>> {
    let Query(query) = query?;
    let ids: Vec<String> = required("id", &query.id_list)?
        .split(',')
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    let orders = state.lifecycle.get_orders(&ids).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// Open orders of a user, newest first.
#[utoipa::path(
    get,
    path = "/v1/orders/user/{address}",
    tag = "orders",
    params(("address" = String, Path, description = "User address")),
    responses(
        (status = 200, description = "User orders", body = OrdersResponse),
        (status = 400, description = "Bad address", body = crate::error::ErrorResponse)
    )
)]
pub async fn user_orders(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> ApiResult<Json<OrdersResponse>> {
    let user = address("user", user.trim())?;
    let orders = state.lifecycle.user_orders(&user).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// Cancel orders with the owner's signature.
#[utoipa::path(
    post,
    path = "/v1/order/cancel",
    tag = "orders",
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Orders cancelled", body = CancelResponse),
        (status = 400, description = "Some cancellations failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_orders(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CancelRequest>, JsonRejection>,
) -> ApiResult<Json<CancelResponse>> {
    let Json(request) = payload?;
    let entries = request.cancel.ok_or(ApiError::Missing("cancel"))?;

    let mut cancelled = Vec::new();
    let mut failures = Vec::new();
    for (owner, order_id, signature) in entries.into_vec() {
        match state
            .lifecycle
            .cancel_by_signature(&owner, &order_id, &signature)
            .await
        {
            Ok(hash) => cancelled.push(render_hash(&hash)),
            Err(e) => failures.push(entry_failure(&order_id, e)),
        }
    }

    if !failures.is_empty() {
        return Err(ApiError::BadRequest(failures.join(",")));
    }
    Ok(Json(CancelResponse { cancelled }))
}

/// Cancel orders with the token returned at submission.
#[utoipa::path(
    post,
    path = "/v1/order/cancelwithtoken",
    tag = "orders",
    request_body = CancelWithTokenRequest,
    responses(
        (status = 200, description = "Orders cancelled", body = CancelResponse),
        (status = 400, description = "Some cancellations failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_orders_with_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CancelWithTokenRequest>, JsonRejection>,
) -> ApiResult<Json<CancelResponse>> {
    let Json(request) = payload?;
    let entries = request.cancel.ok_or(ApiError::Missing("cancel"))?;

    let mut cancelled = Vec::new();
    let mut failures = Vec::new();
    for (order_id, token) in entries.into_vec() {
        match state.lifecycle.cancel_by_token(&order_id, &token).await {
            Ok(hash) => cancelled.push(render_hash(&hash)),
            Err(e) => failures.push(entry_failure(&order_id, e)),
        }
    }

    if !failures.is_empty() {
        return Err(ApiError::BadRequest(failures.join(",")));
    }
    Ok(Json(CancelResponse { cancelled }))
}

/// Quote against the open orders. Set exactly one of the amounts.
#[utoipa::path(
    get,
    path = "/v1/order/quote",
    tag = "orders",
    params(QuoteQuery),
    responses(
        (status = 200, description = "Quote", body = QuoteResponse),
        (status = 400, description = "Bad quote request", body = crate::error::ErrorResponse)
    )
)]
pub async fn quote(
    State(state): State<Arc<AppState>>,
    query: Result<Query<QuoteQuery>, QueryRejection>,
) -> ApiResult<Json<QuoteResponse>> {
    let Query(query) = query?;
    let buy_token = required_address("buyToken", &query.buy_token)?;
    let sell_token = required_address("sellToken", &query.sell_token)?;
    let buy_amount = amount("buyAmount", &query.buy_amount)?;
    let sell_amount = amount("sellAmount", &query.sell_amount)?;

    let quote = state
        .lifecycle
        .quote(buy_token, sell_token, buy_amount, sell_amount)
        .await?;
    Ok(Json(QuoteResponse { quote }))
}

/// Order book of a market given as `buyToken-sellToken` or `buyToken_sellToken`.
#[utoipa::path(
    get,
    path = "/v1/order/orderbook/{tokens}",
    tag = "orders",
    params(
        ("tokens" = String, Path, description = "Market as buyToken-sellToken"),
        OrderBookQuery
    ),
    responses(
        (status = 200, description = "Order book", body = OrderBookResponse),
        (status = 400, description = "Bad market", body = crate::error::ErrorResponse)
    )
)]
pub async fn order_book(
    State(state): State<Arc<AppState>>,
    Path(tokens): Path<String>,
    query: Result<Query<OrderBookQuery>, QueryRejection>,
) -> ApiResult<Json<OrderBookResponse>> {
    let Query(query) = query?;
    let (buy_token, sell_token) = parse_pair(&tokens).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid market {tokens}, expected buyToken-sellToken"))
    })?;

    let orderbook = state
        .lifecycle
        .order_book(buy_token, sell_token, flag(&query.both))
        .await?;
    Ok(Json(OrderBookResponse { orderbook }))
}
