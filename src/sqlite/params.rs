use rusqlite::types::Value as SqlValue;

use crate::codec::NativeConversion;
use crate::types::{TIMESTAMP_FORMAT, Value};

/// Fast-path conversion onto SQLite's storage classes.
///
/// Sequences, records and integers beyond `i64` have no storage class and
/// fall back to a JSON TEXT column.
#[must_use]
pub fn to_sqlite_value(value: &Value) -> NativeConversion<SqlValue> {
    let native = match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => match i.as_i64() {
            Some(v) => SqlValue::Integer(v),
            None => return NativeConversion::Unsupported,
        },
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        Value::Timestamp(ts) => SqlValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
        Value::Uuid(id) => SqlValue::Text(id.hyphenated().to_string()),
        Value::Seq(_) | Value::Record(_) => return NativeConversion::Unsupported,
    };
    NativeConversion::Native(native)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::Integer;

    #[test]
    fn scalars_map_to_storage_classes() {
        assert_eq!(
            to_sqlite_value(&Value::Bool(true)),
            NativeConversion::Native(SqlValue::Integer(1))
        );
        assert_eq!(
            to_sqlite_value(&Value::from(2.5_f64)),
            NativeConversion::Native(SqlValue::Real(2.5))
        );
        assert_eq!(
            to_sqlite_value(&Value::Bytes(vec![0, 1])),
            NativeConversion::Native(SqlValue::Blob(vec![0, 1]))
        );
    }

    #[test]
    fn timestamps_are_iso_text() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            to_sqlite_value(&Value::Timestamp(ts)),
            NativeConversion::Native(SqlValue::Text("2024-03-01T10:30:00".into()))
        );
    }

    #[test]
    fn oversized_unsigned_and_collections_are_unsupported() {
        assert_eq!(
            to_sqlite_value(&Value::Int(Integer::U64(u64::MAX))),
            NativeConversion::Unsupported
        );
        assert_eq!(
            to_sqlite_value(&Value::Int(Integer::U64(7))),
            NativeConversion::Native(SqlValue::Integer(7))
        );
        assert_eq!(
            to_sqlite_value(&Value::from(vec![1_i64])),
            NativeConversion::Unsupported
        );
    }
}
