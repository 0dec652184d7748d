//! Signature recovery and signing wallets.
//!
//! `recovery` turns a digest plus a 65-byte signature back into the signing
//! address; `wallet` produces such signatures from a local private key.

pub mod recovery;
pub mod wallet;

pub use recovery::{normalize_signature, recover, try_recover, RecoveryError};
pub use wallet::RelayWallet;
