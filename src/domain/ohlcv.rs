//! TOHLCV kline representation.

use crate::domain::error::SigtraderError;
use crate::domain::table::{Column, Table};
use chrono::DateTime;

pub const TIME: &str = "TIME";
pub const OPEN: &str = "OPEN";
pub const HIGH: &str = "HIGH";
pub const LOW: &str = "LOW";
pub const CLOSE: &str = "CLOSE";
pub const VOLUME: &str = "VOLUME";

/// Columns every kline table must carry.
pub const TOHLCV_COLUMNS: [&str; 6] = [TIME, OPEN, HIGH, LOW, CLOSE, VOLUME];

/// One candle. `time` is the open time in epoch milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Kline {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Render an epoch-millisecond TIME cell as an RFC 3339 timestamp.
pub fn format_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

/// Lay out klines as a table with the TOHLCV columns in canonical order.
pub fn klines_to_table(klines: &[Kline]) -> Result<Table, SigtraderError> {
    Table::from_columns(vec![
        Column::from_values(TIME, klines.iter().map(|k| k.time).collect()),
        Column::from_values(OPEN, klines.iter().map(|k| k.open).collect()),
        Column::from_values(HIGH, klines.iter().map(|k| k.high).collect()),
        Column::from_values(LOW, klines.iter().map(|k| k.low).collect()),
        Column::from_values(CLOSE, klines.iter().map(|k| k.close).collect()),
        Column::from_values(VOLUME, klines.iter().map(|k| k.volume).collect()),
    ])
}
