use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// A column value as read back from a backend row.
///
/// Each backend maps its driver types onto these physical kinds. The row
/// marshaller decodes application types from them, falling back to JSON for
/// `Text`, `Blob` and `Json` columns.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(Uuid),
    /// A JSON or JSONB column, already parsed.
    Json(JsonValue),
    /// A native one-dimensional array.
    Array(Vec<ColumnValue>),
    /// A driver type with no mapping here.
    Other { type_name: String },
}

impl ColumnValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let ColumnValue::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let ColumnValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ColumnValue::Bool(value) => Some(*value),
            ColumnValue::Int(1) => Some(true),
            ColumnValue::Int(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let ColumnValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let ColumnValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Physical kind, for error messages.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            ColumnValue::Null => "null".into(),
            ColumnValue::Bool(_) => "bool".into(),
            ColumnValue::Int(_) => "integer".into(),
            ColumnValue::Float(_) => "float".into(),
            ColumnValue::Text(_) => "text".into(),
            ColumnValue::Blob(_) => "blob".into(),
            ColumnValue::Timestamp(_) => "timestamp".into(),
            ColumnValue::TimestampTz(_) => "timestamptz".into(),
            ColumnValue::Date(_) => "date".into(),
            ColumnValue::Uuid(_) => "uuid".into(),
            ColumnValue::Json(_) => "json".into(),
            ColumnValue::Array(_) => "array".into(),
            ColumnValue::Other { type_name } => type_name.clone(),
        }
    }
}
