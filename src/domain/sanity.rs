//! Schema validators shared by the loader and every pipeline stage.
//!
//! Each check is a pure predicate over a table (or path) that returns the
//! matching validation or type error instead of a bool.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::TOHLCV_COLUMNS;
use crate::domain::table::Table;
use std::path::Path;

/// The table carries at least the TOHLCV columns. Extra columns are allowed.
pub fn check_cols_for_tohlcv(table: &Table) -> Result<(), SigtraderError> {
    check_is_list1_in_list2(&TOHLCV_COLUMNS, &table.column_names())
}

/// Every entry of `list1` is present in `list2`.
pub fn check_is_list1_in_list2<A: AsRef<str>, B: AsRef<str>>(
    list1: &[A],
    list2: &[B],
) -> Result<(), SigtraderError> {
    let missing: Vec<String> = list1
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !list2.iter().any(|other| other.as_ref() == *name))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SigtraderError::MissingColumns {
            missing,
            present: list2.iter().map(|s| s.as_ref().to_string()).collect(),
        })
    }
}

pub fn check_cols_exist<S: AsRef<str>>(names: &[S], table: &Table) -> Result<(), SigtraderError> {
    check_is_list1_in_list2(names, &table.column_names())
}

pub fn check_has_min_len(table: &Table, min_len: usize) -> Result<(), SigtraderError> {
    if table.len() < min_len {
        return Err(SigtraderError::InsufficientData {
            rows: table.len(),
            minimum: min_len,
        });
    }
    Ok(())
}

pub fn check_not_empty(table: &Table, context: &str) -> Result<(), SigtraderError> {
    if table.is_empty() {
        return Err(SigtraderError::EmptyTable {
            context: context.to_string(),
        });
    }
    Ok(())
}

pub fn check_has_no_nans(table: &Table) -> Result<(), SigtraderError> {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| c.has_nulls())
        .map(|c| c.name().to_string())
        .collect();
    if !columns.is_empty() {
        return Err(SigtraderError::MissingValues { columns });
    }
    Ok(())
}

/// Every cell is a strict bool: nulls, 0/1 and text all fail.
pub fn check_contains_only_bools(table: &Table) -> Result<(), SigtraderError> {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| !c.is_all_bool())
        .map(|c| c.name().to_string())
        .collect();
    if !columns.is_empty() {
        return Err(SigtraderError::NotBoolean { columns });
    }
    Ok(())
}

/// Every cell is an integer or float. Bools and text are a type error,
/// undefined cells are a missing-value error.
pub fn check_contains_only_numbers(table: &Table) -> Result<(), SigtraderError> {
    check_numeric_or_null(table)?;
    check_has_no_nans(table)
}

/// Every cell is a number or undefined.
pub fn check_numeric_or_null(table: &Table) -> Result<(), SigtraderError> {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| !c.is_numeric_or_null())
        .map(|c| c.name().to_string())
        .collect();
    if !columns.is_empty() {
        return Err(SigtraderError::NotNumeric { columns });
    }
    Ok(())
}

pub fn check_file_exist(path: &Path) -> Result<(), SigtraderError> {
    if !path.exists() {
        return Err(SigtraderError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

pub fn check_is_file_csv(path: &Path) -> Result<(), SigtraderError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => Ok(()),
        _ => Err(SigtraderError::WrongExtension {
            path: path.display().to_string(),
        }),
    }
}
