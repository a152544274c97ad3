//! Account snapshot used to size orders.

use crate::domain::error::SigtraderError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemState {
    total_balance: Option<f64>,
    current_price: Option<f64>,
}

impl SystemState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_balance(&self) -> Result<f64, SigtraderError> {
        self.total_balance.ok_or_else(|| undefined("total_balance"))
    }

    pub fn set_total_balance(&mut self, value: f64) -> Result<(), SigtraderError> {
        self.total_balance = Some(non_negative("total_balance", value)?);
        Ok(())
    }

    pub fn current_price(&self) -> Result<f64, SigtraderError> {
        self.current_price.ok_or_else(|| undefined("current_price"))
    }

    pub fn set_current_price(&mut self, value: f64) -> Result<(), SigtraderError> {
        self.current_price = Some(non_negative("current_price", value)?);
        Ok(())
    }
}

fn undefined(name: &str) -> SigtraderError {
    SigtraderError::InvalidParameter {
        name: name.to_string(),
        reason: "has not been defined yet".into(),
    }
}

fn non_negative(name: &str, value: f64) -> Result<f64, SigtraderError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SigtraderError::InvalidParameter {
            name: name.to_string(),
            reason: format!("cannot be negative, got {}", value),
        });
    }
    Ok(value)
}
