//! API request handlers.

pub mod admin;
pub mod health;
pub mod markets;
pub mod orders;
pub mod tokens;
pub mod vault;

use alloy_primitives::{Address, U256};
use order_engine::ValidationError;
use relay_core::types::u256_decimal;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// A single entry or a list of entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// A present, non-empty query value.
pub(crate) fn required<'a>(
    field: &'static str,
    value: &'a Option<String>,
) -> ApiResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::Missing(field)),
    }
}

pub(crate) fn address(field: &'static str, value: &str) -> ApiResult<Address> {
    value
        .parse()
        .map_err(|_| ApiError::Order(ValidationError::BadAddress(field).into()))
}

pub(crate) fn required_address(
    field: &'static str,
    value: &Option<String>,
) -> ApiResult<Address> {
    address(field, required(field, value)?)
}

/// Optional integer amount; empty counts as unset.
pub(crate) fn amount(field: &'static str, value: &Option<String>) -> ApiResult<Option<U256>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => u256_decimal::parse(v)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("{field} must be an integer"))),
    }
}

/// Query flags: present and not `false`/`0`.
pub(crate) fn flag(value: &Option<String>) -> bool {
    match value.as_deref().map(str::trim) {
        None => false,
        Some(v) => !matches!(v, "" | "false" | "0"),
    }
}
