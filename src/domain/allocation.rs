//! Order sizing strategies.

use crate::domain::error::SigtraderError;
use crate::domain::system_state::SystemState;
use crate::ports::allocator_port::Allocator;

/// The same amount for every order, regardless of account state.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedAllocation {
    order_size: f64,
}

impl FixedAllocation {
    pub fn new(order_size: f64) -> Result<Self, SigtraderError> {
        if !(order_size.is_finite() && order_size > 0.0) {
            return Err(SigtraderError::InvalidParameter {
                name: "order_size".into(),
                reason: format!("must be a positive number, got {}", order_size),
            });
        }
        Ok(Self { order_size })
    }
}

impl Allocator for FixedAllocation {
    fn order_size(&self, _state: &SystemState) -> Result<f64, SigtraderError> {
        Ok(self.order_size)
    }
}

/// Splits the balance into `trades` equal orders, each priced at the
/// current price.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedNumberOfTrades {
    trades: usize,
}

impl FixedNumberOfTrades {
    pub fn new(trades: usize) -> Result<Self, SigtraderError> {
        if trades == 0 {
            return Err(SigtraderError::InvalidParameter {
                name: "trades".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(Self { trades })
    }
}

impl Allocator for FixedNumberOfTrades {
    fn order_size(&self, state: &SystemState) -> Result<f64, SigtraderError> {
        let balance = state.total_balance()?;
        let price = state.current_price()?;
        if price == 0.0 {
            return Err(SigtraderError::InvalidParameter {
                name: "current_price".into(),
                reason: "must be positive to size an order".into(),
            });
        }
        Ok(balance / self.trades as f64 / price)
    }
}
