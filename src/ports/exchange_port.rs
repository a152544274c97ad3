//! Exchange order placement port trait.

use crate::domain::error::SigtraderError;
use crate::domain::order::{Order, OrderId, Side};

/// What an exchange reports back for an accepted order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub order_id: Option<OrderId>,
    pub symbol: String,
    pub side: Side,
    pub amount: f64,
}

/// Rejections are returned as `SigtraderError::Exchange`.
pub trait ExchangeClient {
    fn place(&mut self, order: &Order) -> Result<OrderReceipt, SigtraderError>;
}
