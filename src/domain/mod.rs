//! Core domain types and logic.

pub mod allocation;
pub mod analysis;
pub mod coin;
pub mod condition;
pub mod config_validation;
pub mod error;
pub mod expression;
pub mod indicator;
pub mod ohlcv;
pub mod order;
pub mod sanity;
pub mod signal;
pub mod strategy;
pub mod system_state;
pub mod table;
