//! Stateless order checks. Rules run in a fixed order and the first failure
//! is reported.

use alloy_primitives::{Address, U256};
use relay_core::config::RelayConfig;
use relay_core::types::{u256_decimal, Order, OrderPayload};
use serde_json::Value;

use crate::error::ValidationError;

/// An order that passed every rule, plus the optional delegate signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    pub order: Order,
    pub signer: Option<Address>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderValidator {
    /// Minimum seconds between now and expiry.
    pub min_expiry_window: u64,
    /// Maximum seconds between now and expiry.
    pub max_expiry_window: u64,
}

impl From<&RelayConfig> for OrderValidator {
    fn from(config: &RelayConfig) -> Self {
        Self {
            min_expiry_window: config.min_expiry_window_secs,
            max_expiry_window: config.max_expiry_window_secs,
        }
    }
}

impl Default for OrderValidator {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

fn required<'a>(
    field: &'static str,
    value: &'a Option<Value>,
) -> Result<&'a Value, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::Missing(field)),
        Some(v) => Ok(v),
    }
}

fn string_field<'a>(
    field: &'static str,
    value: &'a Option<Value>,
) -> Result<&'a str, ValidationError> {
    required(field, value)?
        .as_str()
        .ok_or(ValidationError::WrongType {
            field,
            expected: "string",
        })
}

fn amount_field(field: &'static str, value: &Option<Value>) -> Result<U256, ValidationError> {
    let text = string_field(field, value)?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::NotAnInteger(field));
    }
    u256_decimal::parse(text).ok_or(ValidationError::NotAnInteger(field))
}

fn expiry_field(value: &Option<Value>) -> Result<u64, ValidationError> {
    const FIELD: &str = "expirationTimeSeconds";
    let wrong_type = ValidationError::WrongType {
        field: FIELD,
        expected: "integer",
    };
    match required(FIELD, value)? {
        Value::Number(n) => n.as_u64().ok_or(wrong_type),
        Value::String(s) => s.trim().parse().map_err(|_| wrong_type),
        _ => Err(wrong_type),
    }
}

fn address_field(field: &'static str, text: &str) -> Result<Address, ValidationError> {
    let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"));
    match digits {
        Some(d) if d.len() == 40 && d.bytes().all(|b| b.is_ascii_hexdigit()) => text
            .parse()
            .map_err(|_| ValidationError::BadAddress(field)),
        _ => Err(ValidationError::BadAddress(field)),
    }
}

impl OrderValidator {
    /// Check `payload` at time `now` (seconds since epoch).
    ///
    /// `signer` is the claimed delegate, taken from the request envelope or
    /// the order itself.
    pub fn validate(
        &self,
        payload: &OrderPayload,
        signer: Option<&str>,
        now: u64,
    ) -> Result<ValidatedOrder, ValidationError> {
        // 1. presence, types and address format
        let user = address_field("user", string_field("user", &payload.user)?)?;
        let sell_token =
            address_field("sellToken", string_field("sellToken", &payload.sell_token)?)?;
        let buy_token =
            address_field("buyToken", string_field("buyToken", &payload.buy_token)?)?;
        let sell_amount = amount_field("sellAmount", &payload.sell_amount)?;
        let buy_amount = amount_field("buyAmount", &payload.buy_amount)?;
        let expiration_time_seconds = expiry_field(&payload.expiration_time_seconds)?;

        // 2. amounts
        if sell_amount.is_zero() {
            return Err(ValidationError::NotPositive("sellAmount"));
        }
        if buy_amount.is_zero() {
            return Err(ValidationError::NotPositive("buyAmount"));
        }

        // 3. distinct legs
        if sell_token == buy_token {
            return Err(ValidationError::SameToken);
        }

        // 4. expiry window
        let min = now.saturating_add(self.min_expiry_window);
        let max = now.saturating_add(self.max_expiry_window);
        if expiration_time_seconds < min {
            return Err(ValidationError::ExpiryTooSoon { min });
        }
        if expiration_time_seconds > max {
            return Err(ValidationError::ExpiryTooLate { max });
        }

        // 5. effective signer
        let signer = signer
            .map(|s| address_field("signer", s.trim()))
            .transpose()?;

        Ok(ValidatedOrder {
            order: Order {
                user,
                buy_token,
                sell_token,
                buy_amount,
                sell_amount,
                expiration_time_seconds,
            },
            signer,
        })
    }
}
