//! Order intake and removal.
//!
//! ```text
//! Received ──validate──▶ SchemaValid ──verify──▶ SignatureValid ──insert──▶ Persisted
//!     │                      │                        │                        │
//!     └──────── Rejected ◀───┴────────────────────────┘          Duplicate ◀──┘
//! ```

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use relay_core::config::ExchangeSettings;
use relay_core::signing::{
    cancel_order_message, hash_order, hash_plain_message, Eip712Domain, TypedDataTypes,
};
use relay_core::types::{
    render_hash, Order, OrderFilter, OrderPayload, OrderRecord, SubmittedOrder,
};
use tracing::{debug, info};

use crate::error::{OrderError, Result, ValidationError};
use crate::ports::{OrderStore, QuoteRequest, QuoteSide};
use crate::unix_now;
use crate::validator::OrderValidator;
use crate::verifier::SignatureVerifier;

/// Parse a rendered order id (`0x` + 64 hex digits).
pub fn parse_order_id(id: &str) -> std::result::Result<B256, ValidationError> {
    id.trim()
        .parse()
        .map_err(|_| ValidationError::Invalid(format!("invalid order id {id}")))
}

/// Random bearer token returned to the submitter.
fn new_cancel_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

#[derive(Clone)]
pub struct OrderLifecycleManager {
    store: Arc<dyn OrderStore>,
    verifier: SignatureVerifier,
    validator: OrderValidator,
    domain: Eip712Domain,
    types: TypedDataTypes,
    chain_id: u64,
}

impl OrderLifecycleManager {
    pub fn new(
        store: Arc<dyn OrderStore>,
        verifier: SignatureVerifier,
        validator: OrderValidator,
        exchange: &ExchangeSettings,
    ) -> Self {
        Self {
            store,
            verifier,
            validator,
            domain: exchange.domain.clone(),
            types: exchange.types.clone(),
            chain_id: exchange.chain_id,
        }
    }

    /// EIP-712 digest of `order` under the configured domain and schema.
    pub fn order_hash(&self, order: &Order) -> Result<B256> {
        hash_order(&self.domain, &self.types, order).map_err(|e| match e {
            relay_core::Error::TypedData { message } => ValidationError::Schema(message).into(),
            other => OrderError::Store(other),
        })
    }

    pub async fn submit(
        &self,
        payload: &OrderPayload,
        signature: Option<&str>,
        signer: Option<&str>,
    ) -> Result<SubmittedOrder> {
        self.submit_at(payload, signature, signer, unix_now()).await
    }

    /// Submit as of `now`. `signature` and `signer` fall back to the values
    /// carried inside the payload.
    pub async fn submit_at(
        &self,
        payload: &OrderPayload,
        signature: Option<&str>,
        signer: Option<&str>,
        now: u64,
    ) -> Result<SubmittedOrder> {
        let signer = signer.or(payload.signer.as_deref());
        let validated = self.validator.validate(payload, signer, now)?;

        let signature = signature
            .or(payload.signature.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(OrderError::MissingSignature)?;

        let order = validated.order;
        let hash = self.order_hash(&order)?;

        self.verifier
            .verify(&hash, signature, &order.user, validated.signer.as_ref())
            .await?;

        let cancel_token = new_cancel_token();
        let record = OrderRecord::new(
            hash,
            order,
            auth::normalize_signature(signature),
            cancel_token.clone(),
        );
        if !self.store.insert_order(&record).await? {
            debug!(hash = %hash, "Duplicate order rejected");
            return Err(OrderError::Duplicate);
        }

        info!(
            hash = %hash,
            user = %record.order.user,
            buy_token = %record.order.buy_token,
            sell_token = %record.order.sell_token,
            expires = record.order.expiration_time_seconds,
            "Order accepted"
        );
        Ok(SubmittedOrder { hash, cancel_token })
    }

    /// Cancel with the owner's signature over `cancelorder2:<chainId>:<id>`.
    pub async fn cancel_by_signature(
        &self,
        owner: &str,
        order_id: &str,
        signature: &str,
    ) -> Result<B256> {
        let owner: Address = owner
            .trim()
            .parse()
            .map_err(|_| ValidationError::BadAddress("owner"))?;
        let hash = parse_order_id(order_id)?;

        let digest = hash_plain_message(&cancel_order_message(self.chain_id, &render_hash(&hash)));
        self.verifier.verify(&digest, signature, &owner, None).await?;

        if !self.store.delete_by_hash_and_owner(&hash, &owner).await? {
            return Err(OrderError::NotFound);
        }
        info!(hash = %hash, owner = %owner, "Order cancelled by signature");
        Ok(hash)
    }

    /// Cancel with the token handed out at submission.
    pub async fn cancel_by_token(&self, order_id: &str, token: &str) -> Result<B256> {
        let hash = parse_order_id(order_id)?;
        if token.is_empty() || !self.store.delete_by_hash_and_token(&hash, token).await? {
            return Err(OrderError::NotFound);
        }
        info!(hash = %hash, "Order cancelled by token");
        Ok(hash)
    }

    pub async fn quote(
        &self,
        buy_token: Address,
        sell_token: Address,
        buy_amount: Option<U256>,
        sell_amount: Option<U256>,
    ) -> Result<Vec<OrderRecord>> {
        self.quote_at(buy_token, sell_token, buy_amount, sell_amount, unix_now())
            .await
    }

    /// Best-priced orders covering exactly one of the two amounts. A zero
    /// amount counts as unset.
    pub async fn quote_at(
        &self,
        buy_token: Address,
        sell_token: Address,
        buy_amount: Option<U256>,
        sell_amount: Option<U256>,
        now: u64,
    ) -> Result<Vec<OrderRecord>> {
        let buy_amount = buy_amount.filter(|a| !a.is_zero());
        let sell_amount = sell_amount.filter(|a| !a.is_zero());
        let side = match (buy_amount, sell_amount) {
            (Some(amount), None) => QuoteSide::Buy(amount),
            (None, Some(amount)) => QuoteSide::Sell(amount),
            _ => {
                return Err(OrderError::InvalidQuote(
                    "Either set buyAmount or set sellAmount".into(),
                ))
            }
        };
        if buy_token == sell_token {
            return Err(ValidationError::SameToken.into());
        }

        let request = QuoteRequest {
            buy_token,
            sell_token,
            side,
        };
        Ok(self.store.quote(&request, now).await?)
    }

    /// Open orders of a pair, best price first.
    pub async fn orders(&self, filter: &OrderFilter) -> Result<Vec<OrderRecord>> {
        Ok(self.store.query_by_filter(filter).await?)
    }

    /// Orders by rendered id. Fails with `NotFound` when none exist.
    pub async fn get_orders(&self, ids: &[String]) -> Result<Vec<OrderRecord>> {
        let hashes = ids
            .iter()
            .map(|id| parse_order_id(id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let orders = self.store.get_orders(&hashes).await?;
        if orders.is_empty() {
            return Err(OrderError::NotFound);
        }
        Ok(orders)
    }

    pub async fn user_orders(&self, user: &Address) -> Result<Vec<OrderRecord>> {
        Ok(self.store.get_user_orders(user).await?)
    }

    /// Live open orders of `buy_token`/`sell_token`, plus the opposite side
    /// when `both` is set.
    pub async fn order_book(
        &self,
        buy_token: Address,
        sell_token: Address,
        both: bool,
    ) -> Result<Vec<Vec<OrderRecord>>> {
        let now = unix_now();
        let mut sides = vec![(buy_token, sell_token)];
        if both {
            sides.push((sell_token, buy_token));
        }

        let mut books = Vec::with_capacity(sides.len());
        for (buy_token, sell_token) in sides {
            let filter = OrderFilter {
                buy_token,
                sell_token,
                expires_after: Some(now),
            };
            books.push(self.store.query_by_filter(&filter).await?);
        }
        Ok(books)
    }
}
