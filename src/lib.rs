//! sigtrader — indicator, condition and signal pipeline for OHLCV data with
//! signal-driven order mapping.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod logging;
pub mod ports;
