//! Encoding an application value into backend column values.
//!
//! Every value first goes through [`Backend::to_native`]. Only an explicit
//! [`NativeConversion::Unsupported`] leads to the second attempt: split a
//! record into named columns, or serialize the value as one JSON column.

use serde::Serialize;

use super::{EncoderOptions, NilEncodingStrategy};
use crate::backend::Backend;
use crate::codec::ser::to_value;
use crate::error::EncodeError;
use crate::types::Value;

/// Result of the fast-path conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeConversion<N> {
    Native(N),
    /// The backend has no column type for the value.
    Unsupported,
}

/// Where an encoded column came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    /// A single value encoded at this binding position.
    Position(usize),
    /// A record field, after key strategy and prefix.
    Name(String),
}

impl ColumnKey {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            ColumnKey::Name(name) => Some(name),
            ColumnKey::Position(_) => None,
        }
    }
}

/// Encode a serializable value.
///
/// # Errors
/// Returns `EncodeError::UnsupportedValue` if the value cannot be reflected
/// or serialized as JSON.
pub fn encode<B: Backend, T: Serialize + ?Sized>(
    value: &T,
    options: &EncoderOptions,
) -> Result<Vec<(ColumnKey, B::Native)>, EncodeError> {
    encode_value::<B>(&to_value(value)?, options)
}

/// Encode a value into `(key, native)` pairs.
///
/// A natively bindable value yields one positional pair. A non-empty record
/// yields one pair per field, subject to the nil policy. Anything else is a
/// single JSON column.
///
/// # Errors
/// Returns `EncodeError::UnsupportedValue` if the JSON fallback fails.
pub fn encode_value<B: Backend>(
    value: &Value,
    options: &EncoderOptions,
) -> Result<Vec<(ColumnKey, B::Native)>, EncodeError> {
    encode_at::<B>(value, 0, options)
}

pub(crate) fn encode_at<B: Backend>(
    value: &Value,
    position: usize,
    options: &EncoderOptions,
) -> Result<Vec<(ColumnKey, B::Native)>, EncodeError> {
    if let NativeConversion::Native(native) = B::to_native(value) {
        return Ok(vec![(ColumnKey::Position(position), native)]);
    }

    match value {
        Value::Record(fields) if !fields.is_empty() => {
            let mut columns = Vec::with_capacity(fields.len());
            for (name, field) in fields {
                if field.is_null() && options.nil_encoding == NilEncodingStrategy::SkipColumn {
                    continue;
                }
                // Nested records and sequences are never split further.
                let native = encode_binding::<B>(field)?;
                columns.push((ColumnKey::Name(options.column_name(name)), native));
            }
            Ok(columns)
        }
        _ => Ok(vec![(ColumnKey::Position(position), json_column::<B>(value)?)]),
    }
}

/// Encode a value as exactly one native column: fast path, else JSON.
///
/// # Errors
/// Returns `EncodeError::UnsupportedValue` if the JSON fallback fails.
pub fn encode_binding<B: Backend>(value: &Value) -> Result<B::Native, EncodeError> {
    match B::to_native(value) {
        NativeConversion::Native(native) => Ok(native),
        NativeConversion::Unsupported => json_column::<B>(value),
    }
}

fn json_column<B: Backend>(value: &Value) -> Result<B::Native, EncodeError> {
    serde_json::to_vec(value)
        .map(B::json_column)
        .map_err(|e| EncodeError::UnsupportedValue(format!("{} as JSON: {e}", value.kind())))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::write_numbered;
    use crate::codec::KeyEncodingStrategy;
    use serde::Serialize;

    /// Binds scalars as themselves and JSON as text tagged with `json:`.
    pub(crate) struct TestBackend;

    impl Backend for TestBackend {
        type Native = Value;
        const NAME: &'static str = "test";

        fn write_placeholder(out: &mut String, position: usize) {
            write_numbered(out, '$', position);
        }

        fn to_native(value: &Value) -> NativeConversion<Value> {
            match value {
                Value::Seq(_) | Value::Record(_) => NativeConversion::Unsupported,
                other => NativeConversion::Native(other.clone()),
            }
        }

        fn json_column(document: Vec<u8>) -> Value {
            Value::Text(format!("json:{}", String::from_utf8_lossy(&document)))
        }

        fn null() -> Value {
            Value::Null
        }
    }

    #[derive(Serialize)]
    struct Todo {
        id: i64,
        title: String,
        #[serde(rename = "dueDate")]
        due_date: Option<String>,
        tags: Vec<String>,
    }

    fn todo() -> Todo {
        Todo {
            id: 3,
            title: "ship".into(),
            due_date: None,
            tags: vec!["a".into(), "b".into()],
        }
    }

    #[test]
    fn scalar_takes_fast_path() {
        let cols =
            encode_value::<TestBackend>(&Value::from(42_i32), &EncoderOptions::new()).unwrap();
        assert_eq!(cols, vec![(ColumnKey::Position(0), Value::from(42_i32))]);
    }

    #[test]
    fn record_splits_into_named_columns() {
        let cols = encode::<TestBackend, _>(&todo(), &EncoderOptions::new()).unwrap();
        let names: Vec<_> = cols.iter().filter_map(|(k, _)| k.name()).collect();
        assert_eq!(names, ["id", "title", "tags"]);
        assert_eq!(cols[2].1, Value::Text(r#"json:["a","b"]"#.into()));
    }

    #[test]
    fn nil_policy_and_key_strategy_are_per_call() {
        let opts = EncoderOptions::new()
            .prefix("t_")
            .key_encoding(KeyEncodingStrategy::ConvertToSnakeCase)
            .nil_encoding(NilEncodingStrategy::EncodeAsNull);
        let cols = encode::<TestBackend, _>(&todo(), &opts).unwrap();
        assert_eq!(
            cols[2],
            (ColumnKey::Name("t_due_date".into()), Value::Null)
        );
        assert_eq!(cols.len(), 4);
    }

    #[test]
    fn bare_sequence_and_empty_record_fall_back_to_json() {
        let seq = Value::from(vec![1_i64, 2]);
        let cols = encode_value::<TestBackend>(&seq, &EncoderOptions::new()).unwrap();
        assert_eq!(cols, vec![(ColumnKey::Position(0), Value::Text("json:[1,2]".into()))]);

        let empty = Value::Record(Vec::new());
        let cols = encode_value::<TestBackend>(&empty, &EncoderOptions::new()).unwrap();
        assert_eq!(cols, vec![(ColumnKey::Position(0), Value::Text("json:{}".into()))]);
    }

    #[test]
    fn nested_record_field_is_one_json_column() {
        let value = Value::record([
            ("id", Value::from(1_i64)),
            ("owner", Value::record([("name", Value::from("kim"))])),
        ]);
        let cols = encode_value::<TestBackend>(&value, &EncoderOptions::new()).unwrap();
        assert_eq!(
            cols[1],
            (
                ColumnKey::Name("owner".into()),
                Value::Text(r#"json:{"name":"kim"}"#.into())
            )
        );
    }
}
