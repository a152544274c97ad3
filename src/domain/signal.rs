//! Trading signals built from condition columns.

use crate::domain::condition::Condition;
use crate::domain::error::SigtraderError;
use crate::domain::sanity;
use crate::domain::table::{Column, Table};

pub const SIGNAL_ALL_CONDITIONS_TRUE: &str = "SignalAllConditionsTrue";

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// True on rows where every listed condition column is true.
    AllConditionsTrue(Vec<String>),
}

impl Signal {
    pub fn all_conditions_true<S: Into<String>>(conditions: impl IntoIterator<Item = S>) -> Self {
        Signal::AllConditionsTrue(conditions.into_iter().map(Into::into).collect())
    }

    /// Output column name, fixed per variant.
    pub fn name(&self) -> &'static str {
        match self {
            Signal::AllConditionsTrue(_) => SIGNAL_ALL_CONDITIONS_TRUE,
        }
    }

    pub fn conditions(&self) -> &[String] {
        match self {
            Signal::AllConditionsTrue(conditions) => conditions,
        }
    }

    pub fn calculate(&self, conditions: &Table) -> Result<Column, SigtraderError> {
        sanity::check_not_empty(conditions, self.name())?;

        match self {
            Signal::AllConditionsTrue(names) => {
                let column = Condition::check_all_true(names.iter().cloned())
                    .calculate(conditions)
                    .map_err(|e| match e {
                        SigtraderError::Computation { source, .. } => {
                            SigtraderError::computation(self.name(), *source)
                        }
                        other => other,
                    })?;
                Ok(column.renamed(self.name()))
            }
        }
    }
}
