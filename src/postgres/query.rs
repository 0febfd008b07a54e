use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures_util::TryStreamExt;
use serde_json::Value as JsonValue;
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::{Client, Row, Statement};
use uuid::Uuid;

use super::params::PgValue;
use crate::error::SqlMiddlewareDbError;
use crate::results::{ColumnValue, ResultSet};

/// Run a prepared statement and collect its rows.
///
/// Column names come from the statement, so an empty result still carries them.
///
/// # Errors
/// Returns errors from query execution or value extraction.
pub async fn build_result_set(
    client: &Client,
    stmt: &Statement,
    params: &[PgValue],
) -> Result<ResultSet, SqlMiddlewareDbError> {
    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(0);
    result_set.set_column_names(Arc::new(column_names));

    let rows = client.query_raw(stmt, params.iter()).await?;
    tokio::pin!(rows);
    while let Some(row) = rows.try_next().await? {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(postgres_extract_value(&row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

fn get<'a, T: FromSql<'a>>(
    row: &'a Row,
    idx: usize,
    wrap: impl FnOnce(T) -> ColumnValue,
) -> Result<ColumnValue, SqlMiddlewareDbError> {
    let val: Option<T> = row.try_get(idx)?;
    Ok(val.map_or(ColumnValue::Null, wrap))
}

fn get_array<'a, T: FromSql<'a>>(
    row: &'a Row,
    idx: usize,
    wrap: impl Fn(T) -> ColumnValue,
) -> Result<ColumnValue, SqlMiddlewareDbError> {
    let val: Option<Vec<Option<T>>> = row.try_get(idx)?;
    Ok(val.map_or(ColumnValue::Null, |items| {
        ColumnValue::Array(
            items
                .into_iter()
                .map(|item| item.map_or(ColumnValue::Null, &wrap))
                .collect(),
        )
    }))
}

/// Extracts a `ColumnValue` from a `tokio_postgres` Row at the given index.
///
/// Types without a mapping come back as `ColumnValue::Other`, which the
/// decoder reports as an unsupported column type.
///
/// # Errors
/// Returns `SqlMiddlewareDbError` if the column cannot be retrieved.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<ColumnValue, SqlMiddlewareDbError> {
    let type_info = row.columns()[idx].type_();

    match *type_info {
        Type::BOOL => get(row, idx, ColumnValue::Bool),
        Type::INT2 => get(row, idx, |v: i16| ColumnValue::Int(i64::from(v))),
        Type::INT4 => get(row, idx, |v: i32| ColumnValue::Int(i64::from(v))),
        Type::INT8 => get(row, idx, ColumnValue::Int),
        Type::FLOAT4 => get(row, idx, |v: f32| ColumnValue::Float(f64::from(v))),
        Type::FLOAT8 => get(row, idx, ColumnValue::Float),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get(row, idx, ColumnValue::Text)
        }
        Type::BYTEA => get(row, idx, ColumnValue::Blob),
        Type::TIMESTAMP => get(row, idx, ColumnValue::Timestamp),
        Type::TIMESTAMPTZ => get(row, idx, |v: DateTime<Utc>| ColumnValue::TimestampTz(v)),
        Type::DATE => get(row, idx, |v: NaiveDate| ColumnValue::Date(v)),
        Type::UUID => get(row, idx, ColumnValue::Uuid),
        Type::JSON | Type::JSONB => get(row, idx, |v: JsonValue| ColumnValue::Json(v)),
        Type::BOOL_ARRAY => get_array(row, idx, ColumnValue::Bool),
        Type::INT2_ARRAY => get_array(row, idx, |v: i16| ColumnValue::Int(i64::from(v))),
        Type::INT4_ARRAY => get_array(row, idx, |v: i32| ColumnValue::Int(i64::from(v))),
        Type::INT8_ARRAY => get_array(row, idx, ColumnValue::Int),
        Type::FLOAT4_ARRAY => get_array(row, idx, |v: f32| ColumnValue::Float(f64::from(v))),
        Type::FLOAT8_ARRAY => get_array(row, idx, ColumnValue::Float),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::BPCHAR_ARRAY => {
            get_array(row, idx, ColumnValue::Text)
        }
        Type::BYTEA_ARRAY => get_array(row, idx, ColumnValue::Blob),
        Type::TIMESTAMP_ARRAY => get_array(row, idx, |v: NaiveDateTime| ColumnValue::Timestamp(v)),
        Type::TIMESTAMPTZ_ARRAY => {
            get_array(row, idx, |v: DateTime<Utc>| ColumnValue::TimestampTz(v))
        }
        Type::DATE_ARRAY => get_array(row, idx, |v: NaiveDate| ColumnValue::Date(v)),
        Type::UUID_ARRAY => get_array(row, idx, |v: Uuid| ColumnValue::Uuid(v)),
        Type::JSON_ARRAY | Type::JSONB_ARRAY => {
            get_array(row, idx, |v: JsonValue| ColumnValue::Json(v))
        }
        _ => Ok(ColumnValue::Other {
            type_name: type_info.name().to_string(),
        }),
    }
}
