//! Analysis orchestration: indicators → conditions → signal.
//!
//! # Protocol
//!
//! 1. Validate the input (non-empty, TOHLCV columns) and the setup (at least
//!    one indicator, one condition and a signal), then check that every column
//!    a condition or the signal refers to will exist. Nothing is computed
//!    until all of this passes.
//! 2. Every indicator runs against the original input table.
//! 3. Every condition runs against the indicator-enriched table.
//! 4. The signal runs against the condition-enriched table.
//!
//! Output column order: input columns, indicator columns, condition columns,
//! then the signal column, each group in registration order.

use crate::domain::condition::Condition;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::TechnicalIndicator;
use crate::domain::sanity;
use crate::domain::signal::Signal;
use crate::domain::table::{Column, Table};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Analysis {
    technical_indicators: Vec<TechnicalIndicator>,
    conditions: Vec<Condition>,
    signal: Option<Signal>,
}

impl Analysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an indicator and return the names of the columns it will add.
    pub fn add_ti(&mut self, ti: TechnicalIndicator) -> Vec<String> {
        let names = ti.names();
        self.technical_indicators.push(ti);
        names
    }

    /// Register a condition and return its column name.
    pub fn add_condition(&mut self, condition: Condition) -> String {
        let name = condition.name().to_string();
        self.conditions.push(condition);
        name
    }

    /// Set (or replace) the signal and return its column name.
    pub fn set_signal(&mut self, signal: Signal) -> String {
        let name = signal.name().to_string();
        self.signal = Some(signal);
        name
    }

    pub fn technical_indicators(&self) -> &[TechnicalIndicator] {
        &self.technical_indicators
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn signal(&self) -> Option<&Signal> {
        self.signal.as_ref()
    }

    pub fn calculate_analysis_data(&self, tohlcv: &Table) -> Result<Table, SigtraderError> {
        let signal = self.perform_sanity_checks(tohlcv)?;

        let analysis_data = self.calculate_technical_indicators(tohlcv)?;
        let analysis_data = self.calculate_conditions(&analysis_data)?;

        let column = signal.calculate(&analysis_data)?;
        debug!(signal = signal.name(), "signal appended");
        analysis_data.with_column(column)
    }

    /// The signal column of [`Analysis::calculate_analysis_data`].
    pub fn calculate_signal(&self, tohlcv: &Table) -> Result<Column, SigtraderError> {
        let analysis_data = self.calculate_analysis_data(tohlcv)?;
        let name = self
            .signal
            .as_ref()
            .map(Signal::name)
            .ok_or(SigtraderError::MissingSetup {
                component: "Signal",
            })?;

        let signal = analysis_data
            .require_column(name)
            .map_err(|_| SigtraderError::InvalidShape {
                reason: format!("signal column {} missing from the analysis data", name),
            })?;
        if !signal.is_all_bool() {
            return Err(SigtraderError::NotBoolean {
                columns: vec![name.to_string()],
            });
        }
        Ok(signal.clone())
    }

    fn perform_sanity_checks(&self, tohlcv: &Table) -> Result<&Signal, SigtraderError> {
        sanity::check_not_empty(tohlcv, "tohlcv")?;
        sanity::check_cols_for_tohlcv(tohlcv)?;
        let signal = self.check_correct_setup()?;
        self.check_references(tohlcv, signal)?;
        Ok(signal)
    }

    fn check_correct_setup(&self) -> Result<&Signal, SigtraderError> {
        if self.technical_indicators.is_empty() {
            return Err(SigtraderError::MissingSetup {
                component: "TechnicalIndicator",
            });
        }
        if self.conditions.is_empty() {
            return Err(SigtraderError::MissingSetup {
                component: "Condition",
            });
        }
        self.signal.as_ref().ok_or(SigtraderError::MissingSetup {
            component: "Signal",
        })
    }

    /// Every referenced column must come from the input, an indicator or an
    /// earlier condition.
    fn check_references(&self, tohlcv: &Table, signal: &Signal) -> Result<(), SigtraderError> {
        let mut known: Vec<String> = tohlcv
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for ti in &self.technical_indicators {
            known.extend(ti.names());
        }
        for condition in &self.conditions {
            sanity::check_is_list1_in_list2(&condition.inputs(), &known)?;
            known.push(condition.name().to_string());
        }
        sanity::check_is_list1_in_list2(signal.conditions(), &known)
    }

    fn calculate_technical_indicators(&self, tohlcv: &Table) -> Result<Table, SigtraderError> {
        let mut analysis_data = tohlcv.clone();
        for ti in &self.technical_indicators {
            let result = ti.calculate(tohlcv)?;
            analysis_data = analysis_data.with_columns(result)?;
        }
        debug!(
            indicators = self.technical_indicators.len(),
            "indicators appended"
        );
        Ok(analysis_data)
    }

    fn calculate_conditions(&self, analysis_data: &Table) -> Result<Table, SigtraderError> {
        let mut new_analysis_data = analysis_data.clone();
        for condition in &self.conditions {
            let result = condition.calculate(&new_analysis_data)?;
            new_analysis_data = new_analysis_data.with_column(result)?;
        }
        debug!(conditions = self.conditions.len(), "conditions appended");
        Ok(new_analysis_data)
    }
}
