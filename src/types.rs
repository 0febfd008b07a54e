use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Text layout for timestamps bound as or read from TEXT columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// The database type a `Database` instance targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatabaseType {
    /// `PostgreSQL` database
    #[cfg(feature = "postgres")]
    Postgres,
    /// `SQLite` database
    #[cfg(feature = "sqlite")]
    Sqlite,
}

/// An integer that remembers the width it was written with.
///
/// Backends use the width to choose a column type (`INT2` vs `INT8` on
/// Postgres) and to range-check before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integer {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl Integer {
    /// The value as `i64`, or `None` for a `U64` above `i64::MAX`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Integer::I8(v) => Some(i64::from(v)),
            Integer::I16(v) => Some(i64::from(v)),
            Integer::I32(v) => Some(i64::from(v)),
            Integer::I64(v) => Some(v),
            Integer::U8(v) => Some(i64::from(v)),
            Integer::U16(v) => Some(i64::from(v)),
            Integer::U32(v) => Some(i64::from(v)),
            Integer::U64(v) => i64::try_from(v).ok(),
        }
    }

    /// Width in bits.
    #[must_use]
    pub fn bits(&self) -> u32 {
        match self {
            Integer::I8(_) | Integer::U8(_) => 8,
            Integer::I16(_) | Integer::U16(_) => 16,
            Integer::I32(_) | Integer::U32(_) => 32,
            Integer::I64(_) | Integer::U64(_) => 64,
        }
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Integer::I8(_) | Integer::I16(_) | Integer::I32(_) | Integer::I64(_)
        )
    }
}

impl Serialize for Integer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Integer::I8(v) => serializer.serialize_i8(v),
            Integer::I16(v) => serializer.serialize_i16(v),
            Integer::I32(v) => serializer.serialize_i32(v),
            Integer::I64(v) => serializer.serialize_i64(v),
            Integer::U8(v) => serializer.serialize_u8(v),
            Integer::U16(v) => serializer.serialize_u16(v),
            Integer::U32(v) => serializer.serialize_u32(v),
            Integer::U64(v) => serializer.serialize_u64(v),
        }
    }
}

/// A structured application value used as a query binding.
///
/// Scalars map onto native column types. A `Record` is split into one
/// column per field when a template names those fields, and a `Seq` is
/// bound natively where the backend has arrays or as JSON otherwise.
/// ```rust
/// use sql_template_middleware::prelude::*;
///
/// let bindings = vec![
///     Value::from(1_i32),
///     Value::from("alice"),
///     Value::from(Some(true)),
///     Value::record([("id", Value::from(7_i64)), ("title", Value::from("x"))]),
/// ];
/// # let _ = bindings;
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    Bool(bool),
    Int(Integer),
    Float(f64),
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    /// Ordered sequence of values
    Seq(Vec<Value>),
    /// Ordered field name to value pairs
    Record(Vec<(String, Value)>),
}

impl Value {
    /// Build a record from `(name, value)` pairs, keeping their order.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(value) = self {
            value.as_i64()
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            Value::Int(i) => match i.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Value::Bytes(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Look up a field of a record by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        if let Value::Record(fields) = self {
            fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
        } else {
            None
        }
    }

    /// Short type label used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::Seq(_) => "sequence",
            Value::Record(_) => "record",
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => i.serialize(serializer),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Value::Timestamp(ts) => ts.serialize(serializer),
            Value::Uuid(id) => id.serialize(serializer),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

macro_rules! integer_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(Integer::$variant(v))
                }
            }
        )*
    };
}

integer_from!(
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(Integer::I64(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Int(Integer::U64(u))
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::Text(s),
            JsonValue::Array(items) => Value::Seq(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => {
                Value::Record(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
