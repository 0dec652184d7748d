//! Order intake errors.

use thiserror::Error;

/// First failing rule of an inbound order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("\"{0}\" is a required field")]
    Missing(&'static str),

    #[error("\"{field}\" should be a type of '{expected}'")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("\"{0}\" should be a non-negative integer string")]
    NotAnInteger(&'static str),

    #[error("{0} must be positive")]
    NotPositive(&'static str),

    #[error("Can't buy and sell the same token")]
    SameToken,

    #[error("\"expirationTimeSeconds\" must be greater than or equal to {min} (now + min expiry window)")]
    ExpiryTooSoon { min: u64 },

    #[error("\"expirationTimeSeconds\" must be less than or equal to {max} (now + max expiry window)")]
    ExpiryTooLate { max: u64 },

    #[error("\"{0}\" should be a valid address")]
    BadAddress(&'static str),

    #[error("order does not match the signing schema: {0}")]
    Schema(String),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("missing signature")]
    MissingSignature,

    #[error("bad signature")]
    BadSignature,

    /// A signature recovered to a key that may not act for the order's user.
    #[error("bad signature: signer is not authorized for this user, check the \"signer\" field")]
    SignerMismatch,

    #[error("order already exists")]
    Duplicate,

    #[error("Order not found")]
    NotFound,

    #[error("{0}")]
    InvalidQuote(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Store(#[from] relay_core::Error),
}

impl OrderError {
    /// Whether the error is caused by the caller rather than the relay.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, OrderError::Store(_) | OrderError::Unavailable(_))
    }

    /// Non-sensitive class of a relay-side failure, `None` for client errors.
    pub fn relay_failure(&self) -> Option<&'static str> {
        match self {
            OrderError::Store(e) => Some(e.category()),
            OrderError::Unavailable(_) => Some("dependency unavailable"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;
