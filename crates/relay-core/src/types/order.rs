//! Order types: the wire payload, the validated order and the persisted record.

use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A signed trade intent as it arrives on the wire.
///
/// Every field is kept as raw JSON so that validation can report exactly
/// which field is missing or malformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub user: Option<Value>,
    pub buy_token: Option<Value>,
    pub sell_token: Option<Value>,
    pub buy_amount: Option<Value>,
    pub sell_amount: Option<Value>,
    pub expiration_time_seconds: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
}

impl From<&Order> for OrderPayload {
    fn from(order: &Order) -> Self {
        Self {
            user: Some(Value::String(format!("{:#x}", order.user))),
            buy_token: Some(Value::String(format!("{:#x}", order.buy_token))),
            sell_token: Some(Value::String(format!("{:#x}", order.sell_token))),
            buy_amount: Some(Value::String(order.buy_amount.to_string())),
            sell_amount: Some(Value::String(order.sell_amount.to_string())),
            expiration_time_seconds: Some(Value::from(order.expiration_time_seconds)),
            signature: None,
            signer: None,
        }
    }
}

/// A validated order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub user: Address,
    pub buy_token: Address,
    pub sell_token: Address,
    #[serde(with = "u256_decimal")]
    pub buy_amount: U256,
    #[serde(with = "u256_decimal")]
    pub sell_amount: U256,
    pub expiration_time_seconds: u64,
}

impl Order {
    /// The order as a typed-data message: lowercase addresses and decimal
    /// integer strings, keyed by the wire field names.
    pub fn to_typed_message(&self) -> Map<String, Value> {
        let mut message = Map::new();
        message.insert("user".into(), format!("{:#x}", self.user).into());
        message.insert("buyToken".into(), format!("{:#x}", self.buy_token).into());
        message.insert("sellToken".into(), format!("{:#x}", self.sell_token).into());
        message.insert("buyAmount".into(), self.buy_amount.to_string().into());
        message.insert("sellAmount".into(), self.sell_amount.to_string().into());
        message.insert(
            "expirationTimeSeconds".into(),
            self.expiration_time_seconds.to_string().into(),
        );
        message
    }

    /// Whether the order has expired at `now` (seconds since epoch).
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expiration_time_seconds <= now
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(with = "b256_hex")]
    pub hash: B256,
    pub order: Order,
    pub signature: String,
    #[serde(with = "u256_decimal")]
    pub unfilled: U256,
    /// Bearer value allowing cancellation without a signature. Only ever
    /// returned to the submitter.
    #[serde(skip_serializing, default)]
    pub cancel_token: String,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn new(hash: B256, order: Order, signature: String, cancel_token: String) -> Self {
        Self {
            hash,
            unfilled: order.sell_amount,
            order,
            signature,
            cancel_token,
            created_at: Utc::now(),
        }
    }

    /// Rendered order id.
    pub fn id(&self) -> String {
        render_hash(&self.hash)
    }

    /// An order is open while some of its sell amount is still unfilled.
    pub fn is_open(&self) -> bool {
        !self.unfilled.is_zero()
    }
}

/// Filter for order-book queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    pub buy_token: Address,
    pub sell_token: Address,
    /// Only orders expiring strictly after this instant.
    pub expires_after: Option<u64>,
}

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedOrder {
    #[serde(with = "b256_hex")]
    pub hash: B256,
    pub cancel_token: String,
}

/// Render a 32-byte digest as `0x`-prefixed lowercase hex.
pub fn render_hash(hash: &B256) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Serde adapter writing `U256` as a decimal string and reading either a
/// decimal string, a `0x` hex string or a JSON number.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => parse(&s).ok_or_else(|| de::Error::custom("invalid integer string")),
            Value::Number(n) => n
                .as_u64()
                .map(U256::from)
                .ok_or_else(|| de::Error::custom("invalid integer")),
            _ => Err(de::Error::custom("expected integer string")),
        }
    }

    /// Parse an unsigned integer from decimal or `0x` hex text.
    pub fn parse(s: &str) -> Option<U256> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return U256::from_str_radix(hex, 16).ok();
        }
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        U256::from_str_radix(s, 10).ok()
    }
}

/// Serde adapter for `0x`-prefixed lowercase digests.
pub mod b256_hex {
    use alloy_primitives::B256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &B256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::render_hash(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<B256, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
