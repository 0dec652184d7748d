//! Clients for external services.

pub mod chain;

pub use chain::ChainClient;
