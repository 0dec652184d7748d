//! Integration tests for component interactions.
//!
//! These tests drive the relay end to end over in-process stores: signing
//! with a real key, delegation, sweeping, market indexing and the HTTP layer.

use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use api_server::{create_router, AppState};
use auth::RelayWallet;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use order_engine::{
    read_active_markets, unix_now, DelegationResolver, ExpirySweeper, MarketIndexer,
    MemoryMarketCache, MemoryOrderStore, OrderError, OrderLifecycleManager,
    OrderValidator, SignatureVerifier, TokenRegistryHandle,
};
use relay_core::config::{ExchangeSettings, RelayConfig};
use relay_core::signing::{add_signer_message, cancel_order_message};
use relay_core::types::{render_hash, Order, OrderPayload, TokenInfo};
use serde_json::{json, Value};
use tower::ServiceExt;

const USDC: Address = address!("2791bca1f2de4661ed88a30c99a7a9449aa84174");
const WETH: Address = address!("7ceb23fd6bc0add59e62ac25578270cff1b9f619");

struct Relay {
    store: Arc<MemoryOrderStore>,
    cache: Arc<MemoryMarketCache>,
    lifecycle: OrderLifecycleManager,
    delegations: DelegationResolver,
    registry: TokenRegistryHandle,
    indexer: MarketIndexer,
}

fn relay() -> Relay {
    let store = Arc::new(MemoryOrderStore::new());
    let cache = Arc::new(MemoryMarketCache::new());
    let delegations = DelegationResolver::new(store.clone());
    let lifecycle = OrderLifecycleManager::new(
        store.clone(),
        SignatureVerifier::new(delegations.clone(), None),
        OrderValidator::default(),
        &ExchangeSettings::default(),
    );
    let registry = TokenRegistryHandle::default();
    let indexer = MarketIndexer::new(store.clone(), cache.clone(), registry.clone());
    Relay {
        store,
        cache,
        lifecycle,
        delegations,
        registry,
        indexer,
    }
}

fn order(user: Address, sell_token: Address, buy_token: Address, expires: u64) -> Order {
    Order {
        user,
        buy_token,
        sell_token,
        buy_amount: U256::from(5u64) * U256::from(10u64).pow(U256::from(17u64)),
        sell_amount: U256::from(1_500_000_000u64),
        expiration_time_seconds: expires,
    }
}

fn usdc() -> TokenInfo {
    TokenInfo {
        address: USDC,
        symbol: "USDC".into(),
        name: "USD Coin".into(),
        decimals: 6,
    }
}

fn weth() -> TokenInfo {
    TokenInfo {
        address: WETH,
        symbol: "WETH".into(),
        name: "Wrapped Ether".into(),
        decimals: 18,
    }
}

async fn sign(relay: &Relay, wallet: &RelayWallet, order: &Order) -> String {
    let hash = relay.lifecycle.order_hash(order).unwrap();
    wallet.sign_hash_hex(&hash).await.unwrap()
}

/// Submitted orders are visible, expire, get swept and drop out of the
/// market snapshot.
#[tokio::test]
async fn test_order_lifecycle_through_sweep_and_index() {
    let relay = relay();
    let wallet = RelayWallet::random();
    let now = unix_now();

    let long_lived = order(wallet.address(), USDC, WETH, now + 3600);
    let short_lived = order(wallet.address(), WETH, USDC, now + 10);
    for o in [&long_lived, &short_lived] {
        let signature = sign(&relay, &wallet, o).await;
        let payload = OrderPayload::from(o);
        relay
            .lifecycle
            .submit_at(&payload, Some(&signature), None, now)
            .await
            .unwrap();
    }
    assert_eq!(relay.store.len().await, 2);

    relay.registry.seed(relay.store.as_ref(), &[usdc()]).await.unwrap();
    let markets = relay.indexer.index_at(now).await.unwrap();
    assert_eq!(markets.len(), 2);
    assert!(markets.iter().all(|m| !m.verified));

    // past expiry plus grace
    let sweeper = ExpirySweeper::new(relay.store.clone(), 3);
    assert_eq!(sweeper.sweep_at(now + 20).await.unwrap(), 1);
    assert_eq!(relay.store.len().await, 1);

    relay.registry.seed(relay.store.as_ref(), &[weth()]).await.unwrap();
    relay.indexer.index_at(now + 20).await.unwrap();
    let published = read_active_markets(relay.cache.as_ref()).await.unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].buy_token, WETH);
    assert_eq!(published[0].sell_token, USDC);
    assert!(published[0].verified);
}

/// A registered delegate may sign on behalf of the vault owner, an
/// unregistered key may not.
#[tokio::test]
async fn test_delegate_signing_across_crates() {
    let relay = relay();
    let owner = RelayWallet::random();
    let delegate = RelayWallet::random();
    let stranger = RelayWallet::random();
    let now = unix_now();

    let o = order(owner.address(), USDC, WETH, now + 3600);
    let payload = OrderPayload::from(&o);
    let delegate_sig = sign(&relay, &delegate, &o).await;
    let signer = delegate.address().to_string();

    let err = relay
        .lifecycle
        .submit_at(&payload, Some(&delegate_sig), Some(&signer), now)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::SignerMismatch));

    let consent = delegate
        .sign_message_hex(add_signer_message(&owner.address()).as_bytes())
        .await
        .unwrap();
    relay
        .delegations
        .register_delegate(&owner.address(), &delegate.address(), &consent)
        .await
        .unwrap();

    let submitted = relay
        .lifecycle
        .submit_at(&payload, Some(&delegate_sig), Some(&signer), now)
        .await
        .unwrap();
    assert!(relay.store.contains(&submitted.hash).await);

    let other = order(owner.address(), USDC, WETH, now + 7200);
    let stranger_sig = sign(&relay, &stranger, &other).await;
    let err = relay
        .lifecycle
        .submit_at(
            &OrderPayload::from(&other),
            Some(&stranger_sig),
            Some(&stranger.address().to_string()),
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::SignerMismatch));
}

/// Only the owner's signature over the cancel message removes an order.
#[tokio::test]
async fn test_cancel_requires_owner_signature() {
    let relay = relay();
    let owner = RelayWallet::random();
    let other = RelayWallet::random();
    let now = unix_now();

    let o = order(owner.address(), USDC, WETH, now + 3600);
    let signature = sign(&relay, &owner, &o).await;
    let submitted = relay
        .lifecycle
        .submit_at(&OrderPayload::from(&o), Some(&signature), None, now)
        .await
        .unwrap();
    let id = render_hash(&submitted.hash);
    let message = cancel_order_message(1, &id);

    let forged = other.sign_message_hex(message.as_bytes()).await.unwrap();
    let owner_str = owner.address().to_string();
    assert!(relay
        .lifecycle
        .cancel_by_signature(&owner_str, &id, &forged)
        .await
        .is_err());
    assert!(relay.store.contains(&submitted.hash).await);

    let genuine = owner.sign_message_hex(message.as_bytes()).await.unwrap();
    relay
        .lifecycle
        .cancel_by_signature(&owner_str, &id, &genuine)
        .await
        .unwrap();
    assert!(relay.store.is_empty().await);
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Delegate registration, submission and market discovery over HTTP.
#[tokio::test]
async fn test_http_delegate_flow() {
    let state = Arc::new(AppState::in_memory(
        ExchangeSettings::default(),
        &RelayConfig::default(),
    ));
    let app = create_router(state.clone());
    let owner = RelayWallet::random();
    let delegate = RelayWallet::random();

    let consent = delegate
        .sign_message_hex(add_signer_message(&owner.address()).as_bytes())
        .await
        .unwrap();
    let uri = format!(
        "/vault/addsigner?ownerAddress={}&signerAddress={}&signature={}",
        owner.address(),
        delegate.address(),
        consent
    );
    let (status, _) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let o = order(owner.address(), USDC, WETH, unix_now() + 3600);
    let hash = state.lifecycle.order_hash(&o).unwrap();
    let signature = delegate.sign_hash_hex(&hash).await.unwrap();
    let body = json!({
        "order": OrderPayload::from(&o),
        "signature": signature,
        "signer": delegate.address().to_string(),
    });
    let (status, submitted) = send(&app, Method::POST, "/v1/order", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["hash"], json!(render_hash(&hash)));

    let (_, markets) = send(&app, Method::GET, "/v1/markets", None).await;
    assert!(markets["markets"].as_array().unwrap().is_empty());

    state.indexer.index_at(unix_now()).await.unwrap();
    let (status, markets) = send(&app, Method::GET, "/v1/markets", None).await;
    assert_eq!(status, StatusCode::OK);
    let markets = markets["markets"].as_array().unwrap();
    assert_eq!(markets.len(), 1);
    let buy: Address = markets[0]["buyToken"].as_str().unwrap().parse().unwrap();
    assert_eq!(buy, WETH);

    let (status, tokens) = send(&app, Method::GET, "/v1/tokens", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tokens["tokens"].as_array().unwrap().len(), 2);
}
