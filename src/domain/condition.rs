//! Boolean conditions over named columns.
//!
//! - `CheckRelation`: compare a numeric column against a constant or, when the
//!   right-hand side names a column, element-wise against that column.
//!   Any comparison touching an undefined cell is `false`.
//! - `CheckAllTrue`: row-wise AND over strictly boolean columns.
//!
//! The canonical name (`SMA_5>2`, `CheckAllTrue=['a', 'b']`) is fixed at
//! construction and used as the output column name.

use crate::domain::error::{ParseError, SigtraderError};
use crate::domain::sanity;
use crate::domain::table::{Column, Table};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Operator {
    /// Longest symbols first so that `<=` is not read as `<`.
    pub const ALL: [Operator; 5] = [
        Operator::Le,
        Operator::Ge,
        Operator::Eq,
        Operator::Lt,
        Operator::Gt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Eq => "==",
        }
    }

    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Operator::Lt => left < right,
            Operator::Le => left <= right,
            Operator::Gt => left > right,
            Operator::Ge => left >= right,
            Operator::Eq => (left - right).abs() < EPSILON,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| ParseError {
                message: format!("invalid relational operator: {}", s),
                position: 0,
            })
    }
}

/// Right-hand side of a relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparand {
    Int(i64),
    Float(f64),
    Column(String),
}

impl fmt::Display for Comparand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparand::Int(v) => write!(f, "{}", v),
            Comparand::Float(v) => write!(f, "{:?}", v),
            Comparand::Column(name) => f.write_str(name),
        }
    }
}

impl From<i64> for Comparand {
    fn from(v: i64) -> Self {
        Comparand::Int(v)
    }
}

impl From<i32> for Comparand {
    fn from(v: i32) -> Self {
        Comparand::Int(v.into())
    }
}

impl From<f64> for Comparand {
    fn from(v: f64) -> Self {
        Comparand::Float(v)
    }
}

impl From<&str> for Comparand {
    fn from(v: &str) -> Self {
        Comparand::Column(v.to_string())
    }
}

impl From<String> for Comparand {
    fn from(v: String) -> Self {
        Comparand::Column(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Relation {
        left: String,
        operator: Operator,
        right: Comparand,
        name: String,
    },
    AllTrue {
        columns: Vec<String>,
        name: String,
    },
}

impl Condition {
    pub fn check_relation(
        left: impl Into<String>,
        operator: Operator,
        right: impl Into<Comparand>,
    ) -> Self {
        let left = left.into();
        let right = right.into();
        let name = format!("{}{}{}", left, operator, right);
        Condition::Relation {
            left,
            operator,
            right,
            name,
        }
    }

    /// An empty column list is accepted here and rejected by `calculate`.
    pub fn check_all_true<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let quoted: Vec<String> = columns.iter().map(|c| format!("'{}'", c)).collect();
        let name = format!("CheckAllTrue=[{}]", quoted.join(", "));
        Condition::AllTrue { columns, name }
    }

    pub fn name(&self) -> &str {
        match self {
            Condition::Relation { name, .. } | Condition::AllTrue { name, .. } => name,
        }
    }

    /// Column names this condition reads.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Condition::Relation { left, right, .. } => match right {
                Comparand::Column(other) => vec![left.as_str(), other.as_str()],
                _ => vec![left.as_str()],
            },
            Condition::AllTrue { columns, .. } => columns.iter().map(String::as_str).collect(),
        }
    }

    pub fn calculate(&self, data: &Table) -> Result<Column, SigtraderError> {
        sanity::check_not_empty(data, self.name())?;

        let inputs = distinct(self.inputs());
        sanity::check_cols_exist(&inputs, data)?;
        match self {
            Condition::Relation { .. } => {
                sanity::check_numeric_or_null(&data.select(&inputs)?)?;
            }
            Condition::AllTrue { .. } => {
                if inputs.is_empty() {
                    return Err(SigtraderError::EmptyConditionList);
                }
                sanity::check_contains_only_bools(&data.select(&inputs)?)?;
            }
        }

        debug!(condition = self.name(), rows = data.len(), "calculating condition");
        self.try_calculate(data)
            .map_err(|e| SigtraderError::computation(self.name(), e))
    }

    fn try_calculate(&self, data: &Table) -> Result<Column, SigtraderError> {
        let values = match self {
            Condition::Relation {
                left,
                operator,
                right,
                ..
            } => {
                let left = data.require_column(left)?.to_f64();
                let right = match right {
                    Comparand::Int(v) => vec![Some(*v as f64); left.len()],
                    Comparand::Float(v) => vec![Some(*v); left.len()],
                    Comparand::Column(other) => data.require_column(other)?.to_f64(),
                };
                compare(&left, *operator, &right)
            }
            Condition::AllTrue { .. } => all_true(&data.select(&distinct(self.inputs()))?)?,
        };
        Ok(Column::from_values(self.name(), values))
    }
}

/// Input names with repeats removed, first occurrence kept.
fn distinct(names: Vec<&str>) -> Vec<&str> {
    let mut unique: Vec<&str> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

fn compare(left: &[Option<f64>], operator: Operator, right: &[Option<f64>]) -> Vec<bool> {
    left.iter()
        .zip(right)
        .map(|(l, r)| match (l, r) {
            (Some(l), Some(r)) => operator.apply(*l, *r),
            _ => false,
        })
        .collect()
}

/// Row-wise AND across every column of `table`.
pub(crate) fn all_true(table: &Table) -> Result<Vec<bool>, SigtraderError> {
    let mut result = vec![true; table.len()];
    for column in table.columns() {
        for (acc, value) in result.iter_mut().zip(column.to_bools()?) {
            *acc &= value;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::domain::table::Value;

    fn sample_data() -> Table {
        Table::from_columns(vec![
            Column::from_values("a", vec![1_i64, 2, 3]),
            Column::from_values("b", vec![3_i64, 2, 1]),
        ])
        .unwrap()
    }

    fn sample_data_extended() -> Table {
        sample_data()
            .with_column(Column::from_values("z", vec![100_i64, 0, -100]))
            .unwrap()
    }

    fn sample_data_with_none() -> Table {
        Table::from_columns(vec![
            Column::new("a", vec![Value::Null, Value::Null, Value::Int(3)]),
            Column::new("b", vec![Value::Null, Value::Int(2), Value::Null]),
        ])
        .unwrap()
    }

    fn sample_conditions() -> Table {
        Table::from_columns(vec![
            Column::from_values("a", vec![true, true, false]),
            Column::from_values("b", vec![true, false, false]),
            Column::from_values("c", vec![true, false, false]),
        ])
        .unwrap()
    }

    fn sample_broken_conditions() -> Table {
        Table::from_columns(vec![
            Column::new("a", vec![Value::Null, Value::Bool(false), Value::Bool(true)]),
            Column::from_values("b", vec![true, false, true]),
            Column::from_values("c", vec![true, false, true]),
        ])
        .unwrap()
    }

    fn sample_extended_conditions() -> Table {
        Table::from_columns(vec![
            Column::from_values("a", vec![true, true, true]),
            Column::from_values("b", vec![true, true, true]),
            Column::from_values("c", vec![true, true, true]),
            Column::new(
                "z",
                vec![Value::Text("TEST".into()), Value::Bool(false), Value::Bool(false)],
            ),
        ])
        .unwrap()
    }

    fn bools(column: Column) -> Vec<bool> {
        column.to_bools().unwrap()
    }

    #[test]
    fn invalid_condition_references() {
        let conditions = [
            Condition::check_relation("z", Operator::Lt, 2),
            Condition::check_relation("a", Operator::Lt, "z"),
            Condition::check_relation("z", Operator::Lt, "a"),
            Condition::check_all_true(["y", "x"]),
            Condition::check_all_true(["y"]),
            Condition::check_all_true(Vec::<String>::new()),
        ];
        for condition in conditions {
            let err = condition.calculate(&sample_data()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{}", condition.name());
        }
    }

    #[test]
    fn empty_list_is_its_own_error() {
        let err = Condition::check_all_true(Vec::<String>::new())
            .calculate(&sample_conditions())
            .unwrap_err();
        assert!(matches!(err, SigtraderError::EmptyConditionList));
    }

    #[test]
    fn no_data() {
        for condition in [
            Condition::check_relation("z", Operator::Lt, 2),
            Condition::check_all_true(["a", "b"]),
        ] {
            assert!(matches!(
                condition.calculate(&Table::new()),
                Err(SigtraderError::EmptyTable { .. })
            ));
        }
    }

    #[test]
    fn broken_data_is_type_error() {
        let cases = [
            (Condition::check_relation("a", Operator::Eq, "b"), sample_conditions()),
            (
                Condition::check_relation("a", Operator::Eq, "b"),
                sample_broken_conditions(),
            ),
            (
                Condition::check_all_true(["a", "b", "c"]),
                sample_broken_conditions(),
            ),
        ];
        for (condition, data) in cases {
            let err = condition.calculate(&data).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Type, "{}", condition.name());
        }
    }

    #[test]
    fn relation_valid_data() {
        let cases: Vec<(Condition, Vec<bool>)> = vec![
            (Condition::check_relation("a", Operator::Lt, 2), vec![true, false, false]),
            (Condition::check_relation("a", Operator::Gt, 2), vec![false, false, true]),
            (Condition::check_relation("a", Operator::Le, 2), vec![true, true, false]),
            (Condition::check_relation("a", Operator::Ge, 2), vec![false, true, true]),
            (Condition::check_relation("a", Operator::Eq, 2), vec![false, true, false]),
            (Condition::check_relation("a", Operator::Lt, "b"), vec![true, false, false]),
            (Condition::check_relation("a", Operator::Gt, "b"), vec![false, false, true]),
            (Condition::check_relation("a", Operator::Le, "b"), vec![true, true, false]),
            (Condition::check_relation("a", Operator::Ge, "b"), vec![false, true, true]),
            (Condition::check_relation("a", Operator::Eq, "b"), vec![false, true, false]),
        ];
        for (condition, expected) in cases {
            assert_eq!(bools(condition.calculate(&sample_data()).unwrap()), expected);
            assert_eq!(
                bools(condition.calculate(&sample_data_extended()).unwrap()),
                expected,
                "extra columns must be ignored by {}",
                condition.name()
            );
        }
    }

    #[test]
    fn all_true_uses_only_selected_columns() {
        let result = Condition::check_all_true(["a", "b", "c"])
            .calculate(&sample_extended_conditions())
            .unwrap();
        assert_eq!(bools(result), vec![true, true, true]);

        let result = Condition::check_all_true(["a", "b", "c"])
            .calculate(&sample_conditions())
            .unwrap();
        assert_eq!(bools(result), vec![true, false, false]);
    }

    #[test]
    fn column_compared_with_itself() {
        let result = Condition::check_relation("a", Operator::Ge, "a")
            .calculate(&sample_data())
            .unwrap();
        assert_eq!(bools(result), vec![true, true, true]);

        let result = Condition::check_relation("a", Operator::Lt, "a")
            .calculate(&sample_data())
            .unwrap();
        assert_eq!(bools(result), vec![false, false, false]);
    }

    #[test]
    fn all_true_with_repeated_column() {
        let result = Condition::check_all_true(["a", "a"])
            .calculate(&sample_conditions())
            .unwrap();
        assert_eq!(bools(result), vec![true, true, false]);

        let result = Condition::check_all_true(["b", "a", "b"])
            .calculate(&sample_conditions())
            .unwrap();
        assert_eq!(bools(result), vec![true, false, false]);
    }

    #[test]
    fn column_relation_false_for_none() {
        for op in Operator::ALL {
            let result = Condition::check_relation("a", op, "b")
                .calculate(&sample_data_with_none())
                .unwrap();
            assert_eq!(bools(result), vec![false, false, false], "operator {}", op);
        }
    }

    #[test]
    fn number_relation_false_for_none() {
        let cases = [
            (Operator::Lt, vec![false, false, false]),
            (Operator::Gt, vec![false, false, true]),
            (Operator::Le, vec![false, false, false]),
            (Operator::Ge, vec![false, false, true]),
            (Operator::Eq, vec![false, false, false]),
        ];
        for (op, expected) in cases {
            let result = Condition::check_relation("a", op, 2)
                .calculate(&sample_data_with_none())
                .unwrap();
            assert_eq!(bools(result), expected, "operator {}", op);
        }
    }

    #[test]
    fn names() {
        let cases = [
            (Condition::check_relation("a", Operator::Lt, 2), "a<2"),
            (Condition::check_relation("a", Operator::Gt, 2), "a>2"),
            (Condition::check_relation("a", Operator::Le, 2), "a<=2"),
            (Condition::check_relation("a", Operator::Ge, 2), "a>=2"),
            (Condition::check_relation("a", Operator::Eq, 2), "a==2"),
            (Condition::check_relation("a", Operator::Lt, 2.5), "a<2.5"),
            (Condition::check_relation("a", Operator::Lt, 2.0), "a<2.0"),
            (Condition::check_relation("a", Operator::Lt, "b"), "a<b"),
            (Condition::check_relation("a", Operator::Eq, "b"), "a==b"),
            (Condition::check_all_true(["a", "b"]), "CheckAllTrue=['a', 'b']"),
        ];
        for (condition, expected) in cases {
            assert_eq!(condition.name(), expected);
        }
    }

    #[test]
    fn output_column_named_after_condition() {
        let column = Condition::check_relation("a", Operator::Lt, 2)
            .calculate(&sample_data())
            .unwrap();
        assert_eq!(column.name(), "a<2");
    }

    #[test]
    fn operator_from_str() {
        assert_eq!("<=".parse::<Operator>().unwrap(), Operator::Le);
        assert_eq!("==".parse::<Operator>().unwrap(), Operator::Eq);
        assert!("!=".parse::<Operator>().is_err());
    }
}
