//! Order Relay: off-chain relay for signed token-exchange orders
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the internal crates. For actual functionality, use the individual crates
//! directly:
//!
//! - `relay-core`: Types, EIP-712 hashing, configuration, Postgres/Redis/RPC clients
//! - `auth`: Signature normalization and recovery, signing wallets
//! - `order-engine`: Validation, verification, order lifecycle, background jobs
//! - `api-server`: REST API server

// Re-export for benchmarks and integration tests
pub use order_engine as engine;
pub use relay_core as core;
