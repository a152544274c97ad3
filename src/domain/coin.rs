//! Holdings of a single currency.

use crate::domain::error::SigtraderError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    name: String,
    total: f64,
    available: f64,
}

impl Coin {
    /// Both figures must be finite and non-negative, with `available <= total`.
    pub fn new(
        name: impl Into<String>,
        total: f64,
        available: f64,
    ) -> Result<Self, SigtraderError> {
        for (field, value) in [("total", total), ("available", available)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SigtraderError::InvalidParameter {
                    name: field.to_string(),
                    reason: format!("must be a non-negative number, got {}", value),
                });
            }
        }
        if available > total {
            return Err(SigtraderError::InvalidParameter {
                name: "available".to_string(),
                reason: format!("{} exceeds the total of {}", available, total),
            });
        }
        Ok(Self {
            name: name.into(),
            total,
            available,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn available(&self) -> f64 {
        self.available
    }

    /// Fails without changing the coin if `amount` would take the total below zero.
    pub fn modify_total_by(&mut self, amount: f64) -> Result<(), SigtraderError> {
        self.total = adjusted("total", self.total, amount)?;
        Ok(())
    }

    pub fn modify_available_by(&mut self, amount: f64) -> Result<(), SigtraderError> {
        self.available = adjusted("available", self.available, amount)?;
        Ok(())
    }

    /// Spend `amount` from both figures, or from neither.
    pub fn debit(&mut self, amount: f64) -> Result<(), SigtraderError> {
        let available = adjusted("available", self.available, -amount)?;
        let total = adjusted("total", self.total, -amount)?;
        self.available = available;
        self.total = total;
        Ok(())
    }
}

fn adjusted(name: &str, current: f64, amount: f64) -> Result<f64, SigtraderError> {
    if amount < 0.0 && amount.abs() > current {
        return Err(SigtraderError::InvalidParameter {
            name: name.to_string(),
            reason: format!("cannot be reduced below zero ({} by {})", current, amount),
        });
    }
    Ok(current + amount)
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total={} available={}",
            self.name, self.total, self.available
        )
    }
}
