//! CSV file data adapter.
//!
//! The header must name every TOHLCV column; other columns are carried along.
//! TOHLCV cells must be numbers, extra columns keep whatever they parse as.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::{TIME, TOHLCV_COLUMNS};
use crate::domain::sanity;
use crate::domain::table::{Column, Table, Value};
use crate::ports::data_port::DataPort;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct CsvAdapter {
    tail: Option<usize>,
}

impl CsvAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the last `rows` rows of every loaded file.
    pub fn with_tail(rows: usize) -> Self {
        Self { tail: Some(rows) }
    }
}

impl DataPort for CsvAdapter {
    fn load_tohlcv(&self, path: &Path) -> Result<Table, SigtraderError> {
        sanity::check_file_exist(path)?;
        sanity::check_is_file_csv(path)?;

        let load_error = |reason: String| SigtraderError::DataLoad {
            path: path.display().to_string(),
            reason,
        };

        let mut rdr = csv::Reader::from_path(path).map_err(|e| load_error(e.to_string()))?;
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| load_error(format!("CSV header error: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        sanity::check_is_list1_in_list2(&TOHLCV_COLUMNS, &headers)?;

        let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        for result in rdr.records() {
            let record = result.map_err(|e| load_error(format!("CSV parse error: {}", e)))?;
            for (i, header) in headers.iter().enumerate() {
                let raw = record.get(i).unwrap_or("").trim();
                let value = if TOHLCV_COLUMNS.contains(&header.as_str()) {
                    parse_tohlcv_cell(header, raw)?
                } else {
                    parse_cell(raw)
                };
                cells[i].push(value);
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        let table = Table::from_columns(columns)?;
        sanity::check_contains_only_numbers(&table.select(&TOHLCV_COLUMNS)?)?;
        debug!(path = %path.display(), rows = table.len(), "csv loaded");

        Ok(match self.tail {
            Some(rows) => table.tail(rows),
            None => table,
        })
    }
}

fn parse_tohlcv_cell(column: &str, raw: &str) -> Result<Value, SigtraderError> {
    if raw.is_empty() {
        return Err(SigtraderError::MissingValues {
            columns: vec![column.to_string()],
        });
    }
    let not_numeric = || SigtraderError::NotNumeric {
        columns: vec![column.to_string()],
    };
    match parse_cell(raw) {
        Value::Int(v) if column == TIME => Ok(Value::Int(v)),
        Value::Int(v) => Ok(Value::Float(v as f64)),
        // NaN is left for the missing-value check after load
        Value::Float(v) if v.is_infinite() => Err(not_numeric()),
        Value::Float(v) if column == TIME => {
            if v.is_finite() && v.fract() == 0.0 {
                Ok(Value::Int(v as i64))
            } else {
                Err(not_numeric())
            }
        }
        Value::Float(v) => Ok(Value::Float(v)),
        _ => Err(not_numeric()),
    }
}

fn parse_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Value::Int(v);
    }
    if let Ok(v) = raw.parse::<f64>() {
        return Value::Float(v);
    }
    match raw.to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Text(raw.to_string()),
    }
}
