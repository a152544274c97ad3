//! Port traits for external collaborators.

pub mod allocator_port;
pub mod config_port;
pub mod data_port;
pub mod exchange_port;
