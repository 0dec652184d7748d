//! Core domain types for the order relay.

pub mod market;
pub mod order;
pub mod token;

pub use market::*;
pub use order::*;
pub use token::*;
