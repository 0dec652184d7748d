//! Admin handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use order_engine::OrderError;
use relay_core::types::TokenInfo;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::IntoParams;

use super::{required, required_address};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddTokenQuery {
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<String>,
    /// Admin key.
    pub key: Option<String>,
}

/// Admit a token to the registry.
#[utoipa::path(
    get,
    path = "/admin/addtoken",
    tag = "admin",
    params(AddTokenQuery),
    responses(
        (status = 200, description = "Token admitted"),
        (status = 400, description = "Rejected", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_token(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AddTokenQuery>, QueryRejection>,
) -> ApiResult<Json<TokenInfo>> {
    let Query(query) = query?;
    let address = required_address("address", &query.address)?;
    let name = required("name", &query.name)?;
    let symbol = required("symbol", &query.symbol)?;
    let decimals = required("decimals", &query.decimals)?
        .parse::<u8>()
        .map_err(|_| ApiError::BadRequest("decimals must be an integer below 256".into()))?;
    let key = required("key", &query.key)?;

    if state.admin_key.is_empty() || key != state.admin_key {
        warn!(address = %address, "Token admission with wrong admin key");
        return Err(OrderError::Unauthorized.into());
    }

    let token = TokenInfo {
        address,
        symbol: symbol.to_string(),
        name: name.to_string(),
        decimals,
    };
    state
        .registry
        .admit(state.store.as_ref(), state.chain.as_deref(), token.clone())
        .await?;
    Ok(Json(token))
}
