//! Strategies: an analysis plus order templates keyed by signal column.
//!
//! Mapping turns every registered `(signal, order)` pair into a column of
//! optional orders named `"{signal}|{symbol}({side})"`. A true signal cell
//! receives its own copy of the template with a fresh [`OrderId`]; false or
//! missing cells receive nothing. Ids are handed out row by row, so they are
//! ascending in time.

use crate::domain::analysis::Analysis;
use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::TIME;
use crate::domain::order::{Order, OrderId};
use crate::domain::system_state::SystemState;
use crate::domain::table::{Table, Value};
use crate::ports::allocator_port::Allocator;
use crate::ports::exchange_port::{ExchangeClient, OrderReceipt};
use tracing::{debug, info, warn};

/// One buy slot and one sell slot.
pub const ALTERNATING_MAX_ORDERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyMode {
    Backtest,
    Live,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRegistration {
    pub signal: String,
    pub order: Order,
}

impl OrderRegistration {
    pub fn column_name(&self) -> String {
        format!(
            "{}|{}({})",
            self.signal,
            self.order.symbol(),
            self.order.side()
        )
    }
}

/// A single cell of the mapped order table, in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub row: usize,
    pub column: String,
    pub time: Option<i64>,
    pub order: Option<Order>,
}

/// Order columns aligned to the rows of the analysis data.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedOrders {
    columns: Vec<(String, Vec<Option<Order>>)>,
    times: Vec<Option<i64>>,
}

impl MappedOrders {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<Order>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cells)| cells.as_slice())
    }

    /// Every placed order, row by row.
    pub fn placed(&self) -> Vec<&Order> {
        let mut placed = Vec::new();
        for row in 0..self.len() {
            for (_, cells) in &self.columns {
                if let Some(order) = &cells[row] {
                    placed.push(order);
                }
            }
        }
        placed
    }

    /// Flatten to one event per cell: row-major, columns in registration order.
    pub fn linearize(&self) -> Vec<OrderEvent> {
        let mut events = Vec::with_capacity(self.len() * self.columns.len());
        for (row, time) in self.times.iter().enumerate() {
            for (name, cells) in &self.columns {
                events.push(OrderEvent {
                    row,
                    column: name.clone(),
                    time: *time,
                    order: cells[row].clone(),
                });
            }
        }
        events
    }
}

#[derive(Debug, Clone)]
pub struct Strategy {
    analysis: Analysis,
    mode: StrategyMode,
    max_orders: Option<usize>,
    orders: Vec<OrderRegistration>,
}

impl Strategy {
    pub fn new(analysis: Analysis, mode: StrategyMode, max_orders: Option<usize>) -> Self {
        Strategy {
            analysis,
            mode,
            max_orders,
            orders: Vec::new(),
        }
    }

    pub fn alternating_backtest(analysis: Analysis) -> Self {
        Self::new(analysis, StrategyMode::Backtest, Some(ALTERNATING_MAX_ORDERS))
    }

    pub fn alternating_live(analysis: Analysis) -> Self {
        Self::new(analysis, StrategyMode::Live, Some(ALTERNATING_MAX_ORDERS))
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn mode(&self) -> StrategyMode {
        self.mode
    }

    pub fn max_orders(&self) -> Option<usize> {
        self.max_orders
    }

    pub fn orders(&self) -> &[OrderRegistration] {
        &self.orders
    }

    /// Register `order` to fire on rows where the `signal` column is true.
    ///
    /// Fails with `TooManyOrders` once the cap is reached; the registry is
    /// left untouched in that case.
    pub fn add_order(
        &mut self,
        signal: impl Into<String>,
        order: Order,
    ) -> Result<(), SigtraderError> {
        let signal = signal.into();
        if signal.trim().is_empty() {
            return Err(SigtraderError::InvalidParameter {
                name: "signal".into(),
                reason: "must not be empty".into(),
            });
        }
        if let Some(limit) = self.max_orders {
            if self.orders.len() >= limit {
                warn!(limit, signal = %signal, "order rejected, strategy is full");
                return Err(SigtraderError::TooManyOrders { limit });
            }
        }
        let registration = OrderRegistration { signal, order };
        debug!(column = %registration.column_name(), "order registered");
        self.orders.push(registration);
        Ok(())
    }

    /// Map every registration over `analysis_data`.
    pub fn map_orders(&self, analysis_data: &Table) -> Result<MappedOrders, SigtraderError> {
        let mut triggers = Vec::with_capacity(self.orders.len());
        for registration in &self.orders {
            triggers.push(signal_triggers(analysis_data, &registration.signal)?);
        }

        let mut cells: Vec<Vec<Option<Order>>> = self
            .orders
            .iter()
            .map(|_| Vec::with_capacity(analysis_data.len()))
            .collect();
        let mut next_id = 1u64;
        for row in 0..analysis_data.len() {
            for (slot, registration) in self.orders.iter().enumerate() {
                let cell = if triggers[slot][row] {
                    let placed = registration.order.place_copy(OrderId(next_id));
                    next_id += 1;
                    Some(placed)
                } else {
                    None
                };
                cells[slot].push(cell);
            }
        }

        let columns = self
            .orders
            .iter()
            .map(OrderRegistration::column_name)
            .zip(cells)
            .collect();
        debug!(placed = next_id - 1, rows = analysis_data.len(), "orders mapped");
        Ok(MappedOrders {
            columns,
            times: row_times(analysis_data),
        })
    }

    /// Run the analysis over `tohlcv` and map the orders onto it.
    pub fn calculate_orders(&self, tohlcv: &Table) -> Result<MappedOrders, SigtraderError> {
        let analysis_data = self.analysis.calculate_analysis_data(tohlcv)?;
        self.map_orders(&analysis_data)
    }

    /// The chronological order sequence for `tohlcv`.
    pub fn execute_orders(&self, tohlcv: &Table) -> Result<Vec<OrderEvent>, SigtraderError> {
        let events = self.calculate_orders(tohlcv)?.linearize();
        info!(
            events = events.len(),
            placed = events.iter().filter(|e| e.order.is_some()).count(),
            "orders executed"
        );
        Ok(events)
    }

    /// Place the orders fired on the most recent row of `tohlcv`.
    ///
    /// With `sizing`, every order is resized by the allocator before it is
    /// sent. Only available in live mode.
    pub fn execute_live(
        &self,
        tohlcv: &Table,
        exchange: &mut dyn ExchangeClient,
        sizing: Option<(&dyn Allocator, &SystemState)>,
    ) -> Result<Vec<OrderReceipt>, SigtraderError> {
        if self.mode != StrategyMode::Live {
            return Err(SigtraderError::InvalidParameter {
                name: "mode".into(),
                reason: "only live strategies place orders on an exchange".into(),
            });
        }

        let mapped = self.calculate_orders(tohlcv)?;
        let Some(last) = mapped.len().checked_sub(1) else {
            return Ok(Vec::new());
        };

        let mut receipts = Vec::new();
        for event in mapped.linearize().into_iter().filter(|e| e.row == last) {
            let Some(order) = event.order else { continue };
            let order = match sizing {
                Some((allocator, state)) => order.with_amount(allocator.order_size(state)?)?,
                None => order,
            };
            info!(order = %order, column = %event.column, "placing order");
            receipts.push(exchange.place(&order)?);
        }
        Ok(receipts)
    }
}

/// Bool cells of the signal column; nulls never fire.
fn signal_triggers(analysis_data: &Table, signal: &str) -> Result<Vec<bool>, SigtraderError> {
    let column = analysis_data.require_column(signal)?;
    column
        .values()
        .iter()
        .map(|value| match value {
            Value::Bool(b) => Ok(*b),
            v if v.is_null() => Ok(false),
            _ => Err(SigtraderError::NotBoolean {
                columns: vec![signal.to_string()],
            }),
        })
        .collect()
}

fn row_times(analysis_data: &Table) -> Vec<Option<i64>> {
    match analysis_data.column(TIME) {
        Some(column) => column
            .values()
            .iter()
            .map(|value| match value {
                Value::Int(t) => Some(*t),
                other => other.as_f64().map(|t| t as i64),
            })
            .collect(),
        None => vec![None; analysis_data.len()],
    }
}
