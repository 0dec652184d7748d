//! API route definitions.

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{admin, health, markets, orders, tokens, vault};
use crate::state::AppState;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Order Relay API",
        version = "1.0.0",
        description = "Relay for signed token-exchange orders"
    ),
    paths(
        health::health_check,
        health::readiness,
        orders::submit_order,
        orders::list_orders,
        orders::get_orders,
        orders::user_orders,
        orders::cancel_orders,
        orders::cancel_orders_with_token,
        orders::quote,
        orders::order_book,
        markets::list_markets,
        markets::market_info,
        markets::relay_info,
        tokens::active_tokens,
        tokens::token_info,
        vault::add_signer,
        admin::add_token,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            health::HealthResponse,
            orders::SubmitOrderRequest,
            orders::SubmitOrderResponse,
            orders::OrdersResponse,
            orders::QuoteResponse,
            orders::OrderBookResponse,
            orders::CancelRequest,
            orders::CancelWithTokenRequest,
            orders::CancelResponse,
            markets::MarketsResponse,
            markets::RelayInfoResponse,
            tokens::ActiveTokensResponse,
            vault::AddSignerResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "orders", description = "Order submission, cancellation and queries"),
        (name = "markets", description = "Active markets"),
        (name = "tokens", description = "Token registry"),
        (name = "vault", description = "Delegate signers"),
        (name = "admin", description = "Registry administration"),
    )
)]
pub struct ApiDoc;

/// Create the main router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))

        // Order endpoints
        .route("/v1/order", post(orders::submit_order).get(orders::get_orders))
        .route("/v1/orders", get(orders::list_orders))
        .route("/v1/orders/user/{address}", get(orders::user_orders))
        .route("/v1/order/cancel", post(orders::cancel_orders))
        .route("/v1/order/cancelwithtoken", post(orders::cancel_orders_with_token))
        .route("/v1/order/quote", get(orders::quote))
        .route("/v1/order/orderbook/{tokens}", get(orders::order_book))

        // Market and token endpoints
        .route("/v1/markets", get(markets::list_markets))
        .route("/v1/markets/info", get(markets::market_info))
        .route("/v1/info", get(markets::relay_info))
        .route("/v1/tokens", get(tokens::active_tokens))
        .route("/v1/tokens/info", get(tokens::token_info))

        // Vault and admin endpoints
        .route("/vault/addsigner", post(vault::add_signer).patch(vault::add_signer))
        .route("/admin/addtoken", get(admin::add_token))

        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))

        // Add state
        .with_state(state)
}
