#![allow(dead_code)]

use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::ohlcv::{Kline, klines_to_table};
use sigtrader::domain::order::Order;
use sigtrader::domain::table::{Column, Table};
use sigtrader::ports::data_port::DataPort;
use sigtrader::ports::exchange_port::{ExchangeClient, OrderReceipt};
use std::path::{Path, PathBuf};

pub const START_TIME: i64 = 1_679_144_400_000;
pub const HOUR_MS: i64 = 3_600_000;

pub struct MockDataPort {
    pub table: Table,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(table: Table) -> Self {
        Self { table, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            table: Table::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn load_tohlcv(&self, path: &Path) -> Result<Table, SigtraderError> {
        if let Some(reason) = &self.error {
            return Err(SigtraderError::DataLoad {
                path: path.display().to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.table.clone())
    }
}

/// Rejects every order.
pub struct RejectingExchange;

impl ExchangeClient for RejectingExchange {
    fn place(&mut self, order: &Order) -> Result<OrderReceipt, SigtraderError> {
        Err(SigtraderError::Exchange {
            reason: format!("rejected {}", order),
        })
    }
}

pub fn make_kline(index: usize, close: f64) -> Kline {
    Kline {
        time: START_TIME + index as i64 * HOUR_MS,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

pub fn klines_from_closes(closes: &[f64]) -> Table {
    let klines: Vec<Kline> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_kline(i, close))
        .collect();
    klines_to_table(&klines).unwrap()
}

/// Four hourly klines with CLOSE = [1, 1, 10, 10].
pub fn example_tohlcv() -> Table {
    klines_from_closes(&[1.0, 1.0, 10.0, 10.0])
}

pub fn insufficient_klines() -> Table {
    klines_from_closes(&[1.0])
}

pub fn not_kline_data() -> Table {
    Table::from_columns(vec![
        Column::from_values("a", vec![1.0, 2.0, 3.0]),
        Column::from_values("b", vec![3.0, 2.0, 1.0]),
    ])
    .unwrap()
}

/// A deterministic zig-zag series around `start_price`.
pub fn generate_klines(count: usize, start_price: f64) -> Table {
    let closes: Vec<f64> = (0..count)
        .map(|i| start_price + (i % 7) as f64 * 1.5 - (i % 3) as f64 * 2.0 + i as f64 * 0.1)
        .collect();
    klines_from_closes(&closes)
}

/// Render a table as CSV the way exchange exports look.
pub fn to_csv(table: &Table) -> String {
    let mut out = table.column_names().join(",");
    out.push('\n');
    for row in 0..table.len() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.values()[row].to_string())
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
