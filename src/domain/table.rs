//! Named-column table shared by every pipeline stage.
//!
//! A [`Table`] is an ordered list of equally long, uniquely named [`Column`]s.
//! Rows are addressed by position. Stages never mutate a table in place:
//! appending columns produces a new table.

use crate::domain::error::SigtraderError;
use std::fmt;

/// A single cell.
///
/// `Null` (and a NaN float) marks a value that is not defined, e.g. the
/// warmup rows of a windowed indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Integer and float cells. Bools are not numbers here.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric value of the cell, `None` for undefined or non-numeric cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) if v.is_nan() => write!(f, "null"),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn from_values<T: Into<Value>>(name: impl Into<String>, values: Vec<T>) -> Self {
        Self::new(name, values.into_iter().map(Into::into).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn has_nulls(&self) -> bool {
        self.values.iter().any(Value::is_null)
    }

    /// Every cell is a strict bool (no nulls, no 0/1, no text).
    pub fn is_all_bool(&self) -> bool {
        self.values.iter().all(|v| matches!(v, Value::Bool(_)))
    }

    /// Every cell is a number or undefined.
    pub fn is_numeric_or_null(&self) -> bool {
        self.values.iter().all(|v| v.is_number() || v.is_null())
    }

    /// Numeric view with `None` for undefined cells.
    pub fn to_f64(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Value::as_f64).collect()
    }

    pub fn to_bools(&self) -> Result<Vec<bool>, SigtraderError> {
        self.values
            .iter()
            .map(Value::as_bool)
            .collect::<Option<Vec<bool>>>()
            .ok_or_else(|| SigtraderError::NotBoolean {
                columns: vec![self.name.clone()],
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting duplicate names and columns of differing length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, SigtraderError> {
        let mut table = Table::new();
        for column in columns {
            table.push(column)?;
        }
        Ok(table)
    }

    fn push(&mut self, column: Column) -> Result<(), SigtraderError> {
        if self.contains(column.name()) {
            return Err(SigtraderError::DuplicateColumn {
                name: column.name().to_string(),
            });
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(SigtraderError::InvalidShape {
                    reason: format!(
                        "column {} has {} rows, expected {}",
                        column.name(),
                        column.len(),
                        first.len()
                    ),
                });
            }
        }
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// True when there are no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column, SigtraderError> {
        self.column(name).ok_or_else(|| {
            SigtraderError::missing_columns(vec![name.to_string()], &self.column_names())
        })
    }

    /// New table holding only `names`, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, SigtraderError> {
        let missing: Vec<String> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|n| !self.contains(n))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(SigtraderError::missing_columns(
                missing,
                &self.column_names(),
            ));
        }
        let columns = names
            .iter()
            .filter_map(|n| self.column(n.as_ref()).cloned())
            .collect();
        Table::from_columns(columns)
    }

    pub fn with_column(&self, column: Column) -> Result<Table, SigtraderError> {
        let mut table = self.clone();
        table.push(column)?;
        Ok(table)
    }

    /// New table with `other`'s columns appended after this table's columns.
    pub fn with_columns(&self, other: Table) -> Result<Table, SigtraderError> {
        let mut table = self.clone();
        for column in other.columns {
            table.push(column)?;
        }
        Ok(table)
    }

    /// Last `n` rows, re-indexed from zero.
    pub fn tail(&self, n: usize) -> Table {
        let start = self.len().saturating_sub(n);
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name(), c.values()[start..].to_vec()))
                .collect(),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.column_names().join("\t"))?;
        for row in 0..self.len() {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| c.values()[row].to_string())
                .collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        Ok(())
    }
}
