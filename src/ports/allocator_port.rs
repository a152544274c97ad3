//! Capital allocation port trait.

use crate::domain::error::SigtraderError;
use crate::domain::system_state::SystemState;

pub trait Allocator {
    /// Amount to trade with the next order.
    fn order_size(&self, state: &SystemState) -> Result<f64, SigtraderError>;
}
