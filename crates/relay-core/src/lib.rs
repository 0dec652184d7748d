//! Relay Core Library
//!
//! Shared types, EIP-712 typed-data hashing, configuration, and the Postgres,
//! Redis and chain RPC clients used by the order relay.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod signing;
pub mod types;

pub use error::{Error, Result};
