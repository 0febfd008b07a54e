use std::sync::Arc;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Statement, params_from_iter};

use crate::error::SqlMiddlewareDbError;
use crate::results::{ColumnValue, ResultSet};

/// Extract a `ColumnValue` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlMiddlewareDbError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<ColumnValue, SqlMiddlewareDbError> {
    let value: SqlValue = row.get(idx)?;
    Ok(match value {
        SqlValue::Null => ColumnValue::Null,
        SqlValue::Integer(i) => ColumnValue::Int(i),
        SqlValue::Real(f) => ColumnValue::Float(f),
        SqlValue::Text(s) => ColumnValue::Text(s),
        SqlValue::Blob(b) => ColumnValue::Blob(b),
    })
}

/// Build a result set from a prepared `SQLite` statement.
///
/// # Errors
/// Returns `SqlMiddlewareDbError::SqliteError` if execution or extraction fails.
pub fn build_result_set(
    stmt: &mut Statement<'_>,
    params: &[SqlValue],
) -> Result<ResultSet, SqlMiddlewareDbError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows_iter = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value_sync(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
