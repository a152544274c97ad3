//! In-memory exchange that fills every order immediately.
//!
//! Tracked coins are debited by the amount of each order spending them;
//! an order that would overdraw a tracked coin is rejected.

use crate::domain::coin::Coin;
use crate::domain::error::SigtraderError;
use crate::domain::order::Order;
use crate::ports::exchange_port::{ExchangeClient, OrderReceipt};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct PaperExchange {
    placed: Vec<Order>,
    balances: Vec<Coin>,
}

impl PaperExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances(balances: Vec<Coin>) -> Self {
        Self {
            placed: Vec::new(),
            balances,
        }
    }

    pub fn placed(&self) -> &[Order] {
        &self.placed
    }

    pub fn balances(&self) -> &[Coin] {
        &self.balances
    }

    pub fn balance(&self, currency: &str) -> Option<&Coin> {
        self.balances.iter().find(|c| c.name() == currency)
    }

    fn debit(&mut self, order: &Order) -> Result<(), SigtraderError> {
        let Some(coin) = self
            .balances
            .iter_mut()
            .find(|c| c.name() == order.transaction_currency())
        else {
            return Ok(());
        };
        if order.amount() > coin.available() {
            return Err(SigtraderError::Exchange {
                reason: format!("insufficient {}: {}", coin.name(), order),
            });
        }
        coin.debit(order.amount())
    }
}

impl ExchangeClient for PaperExchange {
    fn place(&mut self, order: &Order) -> Result<OrderReceipt, SigtraderError> {
        self.debit(order)?;
        info!(order = %order, "paper fill");
        self.placed.push(order.clone());
        Ok(OrderReceipt {
            order_id: order.id(),
            symbol: order.symbol().to_string(),
            side: order.side(),
            amount: order.amount(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderId, Side};

    #[test]
    fn records_and_fills() {
        let mut exchange = PaperExchange::new();
        let order = Order::spot_market_sell("ETH/USDT", 2.0)
            .unwrap()
            .place_copy(OrderId(4));

        let receipt = exchange.place(&order).unwrap();
        assert_eq!(receipt.order_id, Some(OrderId(4)));
        assert_eq!(receipt.symbol, "ETH/USDT");
        assert_eq!(receipt.side, Side::Sell);
        assert_eq!(exchange.placed(), &[order]);
    }

    #[test]
    fn debits_tracked_balance() {
        let usdt = Coin::new("USDT", 10.0, 10.0).unwrap();
        let mut exchange = PaperExchange::with_balances(vec![usdt]);
        let order = Order::spot_market_sell("ETH/USDT", 4.0).unwrap();

        exchange.place(&order).unwrap();
        assert_eq!(exchange.balance("USDT").unwrap().available(), 6.0);

        let err = exchange
            .place(&Order::spot_market_sell("ETH/USDT", 7.0).unwrap())
            .unwrap_err();
        assert!(matches!(err, SigtraderError::Exchange { .. }));
        assert_eq!(exchange.placed().len(), 1);
        assert_eq!(exchange.balance("USDT").unwrap().total(), 6.0);
    }

    #[test]
    fn untracked_currency_is_not_limited() {
        let btc = Coin::new("BTC", 0.0, 0.0).unwrap();
        let mut exchange = PaperExchange::with_balances(vec![btc]);
        exchange
            .place(&Order::spot_market_sell("ETH/USDT", 4.0).unwrap())
            .unwrap();
        assert!(exchange.balance("USDT").is_none());
    }
}
