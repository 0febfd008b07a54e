use std::error::Error;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type, WrongType, to_sql_checked};
use tokio_util::bytes::{BufMut, BytesMut};
use uuid::Uuid;

use crate::codec::NativeConversion;
use crate::types::{Integer, Value};

type BoxError = Box<dyn Error + Sync + Send>;

/// A bound Postgres parameter.
///
/// `Null` binds to a parameter of any type. Integers keep their declared
/// width and are narrowed or widened to the statement's parameter type at
/// bind time, with a range check. Text is accepted by UUID, timestamp, date
/// and JSON parameters by parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum PgValue {
    Null,
    Bool(bool),
    Int(Integer),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    /// A serialized JSON document, bound as JSON/JSONB.
    Json(Vec<u8>),
    /// Elements of a one-dimensional array; all non-null elements share a kind.
    Array(Vec<PgValue>),
}

impl PgValue {
    /// Fast-path conversion from an application value.
    pub(crate) fn from_value(value: &Value) -> NativeConversion<PgValue> {
        match value {
            Value::Seq(items) => match homogeneous_array(items) {
                Some(array) => NativeConversion::Native(array),
                None => NativeConversion::Unsupported,
            },
            Value::Record(_) => NativeConversion::Unsupported,
            scalar => match scalar_from_value(scalar) {
                Some(native) => NativeConversion::Native(native),
                None => NativeConversion::Unsupported,
            },
        }
    }

    fn kind_tag(&self) -> Option<u8> {
        match self {
            PgValue::Null => None,
            PgValue::Bool(_) => Some(0),
            PgValue::Int(_) => Some(1),
            PgValue::Float(_) => Some(2),
            PgValue::Text(_) => Some(3),
            PgValue::Bytes(_) => Some(4),
            PgValue::Timestamp(_) => Some(5),
            PgValue::Uuid(_) => Some(6),
            PgValue::Json(_) => Some(7),
            PgValue::Array(_) => Some(8),
        }
    }

    fn to_json(&self) -> Result<JsonValue, BoxError> {
        Ok(match self {
            PgValue::Null => JsonValue::Null,
            PgValue::Bool(b) => JsonValue::Bool(*b),
            PgValue::Int(i) => serde_json::to_value(i)?,
            PgValue::Float(f) => serde_json::to_value(f)?,
            PgValue::Text(s) => JsonValue::String(s.clone()),
            PgValue::Bytes(b) => serde_json::to_value(b)?,
            PgValue::Timestamp(ts) => serde_json::to_value(ts)?,
            PgValue::Uuid(id) => JsonValue::String(id.hyphenated().to_string()),
            PgValue::Json(doc) => serde_json::from_slice(doc)?,
            PgValue::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(PgValue::to_json)
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

fn scalar_from_value(value: &Value) -> Option<PgValue> {
    Some(match value {
        Value::Null => PgValue::Null,
        Value::Bool(b) => PgValue::Bool(*b),
        // Postgres has no unsigned 64-bit column.
        Value::Int(i) if i.as_i64().is_none() => return None,
        Value::Int(i) => PgValue::Int(*i),
        Value::Float(f) => PgValue::Float(*f),
        Value::Text(s) => PgValue::Text(s.clone()),
        Value::Bytes(b) => PgValue::Bytes(b.clone()),
        Value::Timestamp(ts) => PgValue::Timestamp(*ts),
        Value::Uuid(id) => PgValue::Uuid(*id),
        Value::Seq(_) | Value::Record(_) => return None,
    })
}

/// Native array for a non-empty sequence of same-kind scalars (nulls allowed).
fn homogeneous_array(items: &[Value]) -> Option<PgValue> {
    let elements: Vec<PgValue> = items.iter().map(scalar_from_value).collect::<Option<_>>()?;
    let mut kinds = elements.iter().filter_map(PgValue::kind_tag);
    let first = kinds.next()?;
    if kinds.all(|k| k == first) {
        Some(PgValue::Array(elements))
    } else {
        None
    }
}

fn wrong<T>(ty: &Type) -> BoxError {
    Box::new(WrongType::new::<T>(ty.clone()))
}

fn narrow<T: TryFrom<i64>>(value: i64, ty: &Type) -> Result<T, BoxError> {
    T::try_from(value).map_err(|_| format!("integer {value} out of range for {ty}").into())
}

impl ToSql for PgValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if let Kind::Array(_) = ty.kind() {
            return match self {
                PgValue::Null => Ok(IsNull::Yes),
                PgValue::Array(items) => items.as_slice().to_sql(ty, out),
                _ => Err(wrong::<PgValue>(ty)),
            };
        }
        match self {
            PgValue::Null => Ok(IsNull::Yes),
            PgValue::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                _ => Err(wrong::<bool>(ty)),
            },
            PgValue::Int(i) => {
                let Some(v) = i.as_i64() else {
                    return Err(format!("integer {i:?} does not fit a signed 64-bit column").into());
                };
                match *ty {
                    Type::INT2 => narrow::<i16>(v, ty)?.to_sql(ty, out),
                    Type::INT4 => narrow::<i32>(v, ty)?.to_sql(ty, out),
                    Type::INT8 => v.to_sql(ty, out),
                    #[allow(clippy::cast_precision_loss)]
                    Type::FLOAT4 => (v as f32).to_sql(ty, out),
                    #[allow(clippy::cast_precision_loss)]
                    Type::FLOAT8 => (v as f64).to_sql(ty, out),
                    _ => Err(wrong::<i64>(ty)),
                }
            }
            PgValue::Float(f) => match *ty {
                #[allow(clippy::cast_possible_truncation)]
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => f.to_sql(ty, out),
                _ => Err(wrong::<f64>(ty)),
            },
            PgValue::Text(s) => text_to_sql(s, ty, out),
            PgValue::Bytes(b) => match *ty {
                Type::BYTEA => b.as_slice().to_sql(ty, out),
                _ => Err(wrong::<Vec<u8>>(ty)),
            },
            PgValue::Timestamp(ts) => match *ty {
                Type::TIMESTAMP => ts.to_sql(ty, out),
                Type::TIMESTAMPTZ => ts.and_utc().to_sql(ty, out),
                Type::DATE => ts.date().to_sql(ty, out),
                _ => Err(wrong::<NaiveDateTime>(ty)),
            },
            PgValue::Uuid(id) => match *ty {
                Type::UUID => id.to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => {
                    id.hyphenated().to_string().to_sql(ty, out)
                }
                _ => Err(wrong::<Uuid>(ty)),
            },
            PgValue::Json(doc) => match *ty {
                Type::JSONB => {
                    out.put_u8(1);
                    out.extend_from_slice(doc);
                    Ok(IsNull::No)
                }
                Type::JSON | Type::TEXT | Type::VARCHAR => {
                    out.extend_from_slice(doc);
                    Ok(IsNull::No)
                }
                _ => Err(wrong::<JsonValue>(ty)),
            },
            PgValue::Array(_) => match *ty {
                Type::JSON | Type::JSONB => self.to_json()?.to_sql(ty, out),
                _ => Err(wrong::<Vec<PgValue>>(ty)),
            },
        }
    }

    /// Every parameter type is accepted here so NULL binds anywhere; a value
    /// that does not fit the type is rejected by `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Text parameters are parsed when the column wants a structured type.
fn text_to_sql(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::UUID => Uuid::parse_str(s)?.to_sql(ty, out),
        Type::TIMESTAMP => NaiveDateTime::from_str(s)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => ts.with_timezone(&Utc).to_sql(ty, out),
            Err(_) => NaiveDateTime::from_str(s)?.and_utc().to_sql(ty, out),
        },
        Type::DATE => NaiveDate::from_str(s)?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<JsonValue>(s)
            .unwrap_or_else(|_| JsonValue::String(s.to_string()))
            .to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => s.to_sql(ty, out),
        _ => Err(wrong::<String>(ty)),
    }
}
