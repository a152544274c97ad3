//! Order value objects.
//!
//! An [`Order`] registered on a strategy is a template. Every row where its
//! signal fires receives its own copy via [`Order::place_copy`], stamped with
//! a fresh [`OrderId`] so placed orders can be told apart and tracked.

use crate::domain::error::SigtraderError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    SpotMarketBuy,
    SpotMarketSell,
}

impl OrderKind {
    pub fn side(self) -> Side {
        match self {
            OrderKind::SpotMarketBuy => Side::Buy,
            OrderKind::SpotMarketSell => Side::Sell,
        }
    }
}

/// A `BASE/QUOTE` trading pair such as `BTC/USDT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    base: String,
    quote: String,
}

impl Symbol {
    pub fn parse(pair: &str) -> Result<Self, SigtraderError> {
        match pair.split_once('/') {
            Some((base, quote))
                if !base.trim().is_empty() && !quote.trim().is_empty() && !quote.contains('/') =>
            {
                Ok(Symbol {
                    base: base.trim().to_string(),
                    quote: quote.trim().to_string(),
                })
            }
            _ => Err(SigtraderError::InvalidParameter {
                name: "symbol".into(),
                reason: format!("expected BASE/QUOTE, got {:?}", pair),
            }),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    kind: OrderKind,
    symbol: Symbol,
    amount: f64,
    id: Option<OrderId>,
}

impl Order {
    pub fn new(kind: OrderKind, symbol: &str, amount: f64) -> Result<Self, SigtraderError> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(SigtraderError::InvalidParameter {
                name: "amount".into(),
                reason: format!("must be a positive number, got {}", amount),
            });
        }
        Ok(Order {
            kind,
            symbol: Symbol::parse(symbol)?,
            amount,
            id: None,
        })
    }

    pub fn spot_market_buy(symbol: &str, amount: f64) -> Result<Self, SigtraderError> {
        Self::new(OrderKind::SpotMarketBuy, symbol, amount)
    }

    pub fn spot_market_sell(symbol: &str, amount: f64) -> Result<Self, SigtraderError> {
        Self::new(OrderKind::SpotMarketSell, symbol, amount)
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn side(&self) -> Side {
        self.kind.side()
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// `None` for templates, set on every placed copy.
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    /// The currency spent by this order: the first leg for buys, the second for sells.
    pub fn transaction_currency(&self) -> &str {
        match self.side() {
            Side::Buy => self.symbol.base(),
            Side::Sell => self.symbol.quote(),
        }
    }

    /// Independent copy of this template carrying `id`.
    pub fn place_copy(&self, id: OrderId) -> Order {
        Order {
            id: Some(id),
            ..self.clone()
        }
    }

    /// Same order with a different amount, e.g. after sizing by an allocator.
    pub fn with_amount(&self, amount: f64) -> Result<Order, SigtraderError> {
        let mut order = Order::new(self.kind, &self.symbol.to_string(), amount)?;
        order.id = self.id;
        Ok(order)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.side(), self.amount, self.symbol)?;
        if let Some(id) = self.id {
            write!(f, " {}", id)?;
        }
        Ok(())
    }
}
