//! Typed-message codec.
//!
//! Turns an order (or a plain command string) into the 32-byte digest its
//! signature commits to. The order digest doubles as the order's id.
//!
//! # Architecture
//!
//! ```text
//! ExchangeSettings ─── domain ──► Eip712Domain::separator()
//!       │                                  │
//!       └── types ──► TypedDataEncoder     │
//!                          │               │
//!   Order ─► typed message ┴► hashStruct   │
//!                                 │        │
//!                                 ▼        ▼
//!                 keccak256(0x1901 ‖ separator ‖ structHash)
//! ```

pub mod domain;
pub mod message;
pub mod typed_data;

pub use domain::{Eip712Domain, EIP712_DOMAIN_TYPE};
pub use message::{add_signer_message, cancel_order_message, hash_plain_message};
pub use typed_data::{hash_typed_data, TypedDataEncoder, TypedDataTypes, TypedField};

use alloy_primitives::B256;

use crate::types::Order;
use crate::Result;

/// Primary struct name of a relayed order.
pub const ORDER_PRIMARY_TYPE: &str = "Order";

/// Compute the canonical digest (and id) of an order.
pub fn hash_order(domain: &Eip712Domain, types: &TypedDataTypes, order: &Order) -> Result<B256> {
    hash_typed_data(domain, types, ORDER_PRIMARY_TYPE, &order.to_typed_message())
}

/// The order struct layout used when no schema is configured.
pub fn default_order_types() -> TypedDataTypes {
    let mut types = TypedDataTypes::new();
    types.insert(
        ORDER_PRIMARY_TYPE.to_string(),
        vec![
            TypedField::new("user", "address"),
            TypedField::new("sellToken", "address"),
            TypedField::new("buyToken", "address"),
            TypedField::new("sellAmount", "uint256"),
            TypedField::new("buyAmount", "uint256"),
            TypedField::new("expirationTimeSeconds", "uint256"),
        ],
    );
    types
}
