//! Technical indicators.
//!
//! A [`TechnicalIndicator`] is a stateless configuration. `calculate` checks the
//! input table (TOHLCV columns present, at least `min_len` rows), runs the
//! windowed formula over CLOSE and returns a table holding exactly the
//! indicator's output columns, row-aligned with the input. Leading rows stay
//! undefined until the window fills.

pub mod ema;
pub mod rsi;
pub mod sma;

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::CLOSE;
use crate::domain::sanity;
use crate::domain::table::{Column, Table};
use std::fmt;
use tracing::debug;

pub const DEFAULT_RSI_SCALAR: f64 = 100.0;
pub const DEFAULT_RSI_DRIFT: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum TechnicalIndicator {
    Sma {
        length: usize,
        offset: usize,
    },
    Ema {
        length: usize,
        offset: usize,
    },
    Rsi {
        length: usize,
        scalar: f64,
        drift: usize,
        offset: usize,
    },
}

impl TechnicalIndicator {
    pub fn sma(length: usize) -> Result<Self, SigtraderError> {
        Self::sma_with_offset(length, 0)
    }

    pub fn sma_with_offset(length: usize, offset: usize) -> Result<Self, SigtraderError> {
        check_positive("length", length)?;
        Ok(TechnicalIndicator::Sma { length, offset })
    }

    pub fn ema(length: usize) -> Result<Self, SigtraderError> {
        check_positive("length", length)?;
        Ok(TechnicalIndicator::Ema { length, offset: 0 })
    }

    pub fn rsi(length: usize) -> Result<Self, SigtraderError> {
        Self::rsi_with(length, DEFAULT_RSI_SCALAR, DEFAULT_RSI_DRIFT, 0)
    }

    pub fn rsi_with(
        length: usize,
        scalar: f64,
        drift: usize,
        offset: usize,
    ) -> Result<Self, SigtraderError> {
        check_positive("length", length)?;
        check_positive("drift", drift)?;
        if !scalar.is_finite() {
            return Err(SigtraderError::InvalidParameter {
                name: "scalar".into(),
                reason: format!("must be finite, got {}", scalar),
            });
        }
        Ok(TechnicalIndicator::Rsi {
            length,
            scalar,
            drift,
            offset,
        })
    }

    fn length(&self) -> usize {
        match self {
            TechnicalIndicator::Sma { length, .. }
            | TechnicalIndicator::Ema { length, .. }
            | TechnicalIndicator::Rsi { length, .. } => *length,
        }
    }

    fn offset(&self) -> usize {
        match self {
            TechnicalIndicator::Sma { offset, .. }
            | TechnicalIndicator::Ema { offset, .. }
            | TechnicalIndicator::Rsi { offset, .. } => *offset,
        }
    }

    /// Minimum number of rows `calculate` accepts.
    pub fn min_len(&self) -> usize {
        self.length()
    }

    /// Output column name, e.g. `SMA_5`.
    pub fn name(&self) -> String {
        match self {
            TechnicalIndicator::Sma { length, .. } => format!("SMA_{}", length),
            TechnicalIndicator::Ema { length, .. } => format!("EMA_{}", length),
            TechnicalIndicator::Rsi { length, .. } => format!("RSI_{}", length),
        }
    }

    /// Every column `calculate` produces, in output order.
    pub fn names(&self) -> Vec<String> {
        vec![self.name()]
    }

    pub fn calculate(&self, klines: &Table) -> Result<Table, SigtraderError> {
        sanity::check_cols_for_tohlcv(klines)?;
        sanity::check_has_min_len(klines, self.min_len())?;
        sanity::check_numeric_or_null(&klines.select(&[CLOSE])?)?;

        debug!(indicator = %self, rows = klines.len(), "calculating indicator");
        self.try_calculate(klines)
            .map_err(|e| SigtraderError::computation(self.name(), e))
    }

    fn try_calculate(&self, klines: &Table) -> Result<Table, SigtraderError> {
        let close = klines.require_column(CLOSE)?.to_f64();

        let values = match self {
            TechnicalIndicator::Sma { length, .. } => sma::calculate_sma(&close, *length),
            TechnicalIndicator::Ema { length, .. } => ema::calculate_ema(&close, *length),
            TechnicalIndicator::Rsi {
                length,
                scalar,
                drift,
                ..
            } => rsi::calculate_rsi(&close, *length, *scalar, *drift),
        };
        let values = shift(values, self.offset());

        if values.len() != klines.len() {
            return Err(SigtraderError::InvalidShape {
                reason: format!(
                    "{} produced {} rows for {} input rows",
                    self.name(),
                    values.len(),
                    klines.len()
                ),
            });
        }

        Table::from_columns(vec![Column::from_values(self.name(), values)])
    }
}

impl fmt::Display for TechnicalIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TechnicalIndicator::Sma { length, .. } => write!(f, "SMA({})", length),
            TechnicalIndicator::Ema { length, .. } => write!(f, "EMA({})", length),
            TechnicalIndicator::Rsi { length, .. } => write!(f, "RSI({})", length),
        }
    }
}

fn check_positive(name: &str, value: usize) -> Result<(), SigtraderError> {
    if value == 0 {
        return Err(SigtraderError::InvalidParameter {
            name: name.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

/// Move values `offset` rows later, filling the vacated rows as undefined.
fn shift(values: Vec<Option<f64>>, offset: usize) -> Vec<Option<f64>> {
    if offset == 0 {
        return values;
    }
    let len = values.len();
    std::iter::repeat_n(None, offset.min(len))
        .chain(values)
        .take(len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::domain::ohlcv::{klines_to_table, Kline};
    use crate::domain::table::Value;

    fn klines(closes: &[f64]) -> Table {
        let klines: Vec<Kline> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Kline {
                time: i as i64,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect();
        klines_to_table(&klines).unwrap()
    }

    #[test]
    fn names() {
        assert_eq!(TechnicalIndicator::sma(5).unwrap().names(), vec!["SMA_5"]);
        assert_eq!(TechnicalIndicator::rsi(5).unwrap().names(), vec!["RSI_5"]);
        assert_eq!(TechnicalIndicator::ema(9).unwrap().names(), vec!["EMA_9"]);
    }

    #[test]
    fn min_len_is_length() {
        assert_eq!(TechnicalIndicator::sma(5).unwrap().min_len(), 5);
        assert_eq!(TechnicalIndicator::rsi(5).unwrap().min_len(), 5);
    }

    #[test]
    fn display() {
        assert_eq!(TechnicalIndicator::sma(20).unwrap().to_string(), "SMA(20)");
        assert_eq!(TechnicalIndicator::rsi(14).unwrap().to_string(), "RSI(14)");
    }

    #[test]
    fn zero_length_rejected() {
        for result in [
            TechnicalIndicator::sma(0),
            TechnicalIndicator::ema(0),
            TechnicalIndicator::rsi(0),
            TechnicalIndicator::rsi_with(5, 100.0, 0, 0),
        ] {
            assert!(matches!(
                result,
                Err(SigtraderError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn output_columns_match_names() {
        let data = klines(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        for ti in [
            TechnicalIndicator::sma(5).unwrap(),
            TechnicalIndicator::rsi(5).unwrap(),
            TechnicalIndicator::ema(5).unwrap(),
        ] {
            let out = ti.calculate(&data).unwrap();
            assert_eq!(out.column_names(), ti.names());
            assert_eq!(out.len(), data.len());
        }
    }

    #[test]
    fn sma_leading_rows_undefined() {
        let out = TechnicalIndicator::sma(2)
            .unwrap()
            .calculate(&klines(&[1.0, 1.0, 10.0, 10.0]))
            .unwrap();
        assert_eq!(
            out.column("SMA_2").unwrap().values(),
            &[
                Value::Null,
                Value::Float(1.0),
                Value::Float(5.5),
                Value::Float(10.0)
            ]
        );
    }

    #[test]
    fn offset_shifts_forward() {
        let out = TechnicalIndicator::sma_with_offset(2, 1)
            .unwrap()
            .calculate(&klines(&[1.0, 3.0, 5.0]))
            .unwrap();
        assert_eq!(
            out.column("SMA_2").unwrap().to_f64(),
            vec![None, None, Some(2.0)]
        );
    }

    #[test]
    fn insufficient_rows() {
        let err = TechnicalIndicator::sma(5)
            .unwrap()
            .calculate(&klines(&[1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            SigtraderError::InsufficientData {
                rows: 1,
                minimum: 5
            }
        ));
    }

    #[test]
    fn empty_and_foreign_tables_rejected() {
        let ti = TechnicalIndicator::rsi(5).unwrap();
        assert_eq!(ti.calculate(&Table::new()).unwrap_err().kind(), ErrorKind::Validation);

        let foreign = Table::from_columns(vec![Column::from_values(
            "TEST",
            (0..100_i64).collect(),
        )])
        .unwrap();
        assert!(matches!(
            ti.calculate(&foreign),
            Err(SigtraderError::MissingColumns { .. })
        ));
    }

    #[test]
    fn shift_larger_than_len() {
        assert_eq!(shift(vec![Some(1.0), Some(2.0)], 5), vec![None, None]);
    }
}
