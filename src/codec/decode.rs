//! Row marshalling: a serde `Deserializer` over a [`Row`].
//!
//! Struct targets look up each declared field by column name. Columns are
//! read natively first; when the native kind does not fit the requested
//! type, `Text`, `Blob` and `Json` columns are parsed as JSON documents and
//! the target is deserialized from that. Sequence targets read a `Blob` as
//! its raw bytes.

use serde::de::value::{SeqDeserializer, StrDeserializer, StringDeserializer};
use serde::de::{
    DeserializeOwned, DeserializeSeed, Deserializer, IntoDeserializer, MapAccess, SeqAccess,
    Visitor,
};
use serde_json::Value as JsonValue;

use super::DecoderOptions;
use crate::error::DecodeError;
use crate::results::{ColumnValue, Row};
use crate::types::TIMESTAMP_FORMAT;

/// Decode a row into `T`.
///
/// # Errors
/// - `DecodeError::MissingKey` when a required field has no column.
/// - `DecodeError::TypeMismatch` when a column cannot be read as the field's
///   type, natively or as JSON.
/// - `DecodeError::UnsupportedColumnType` for driver types with no mapping.
pub fn decode_row<T: DeserializeOwned>(
    row: &Row,
    options: &DecoderOptions,
) -> Result<T, DecodeError> {
    T::deserialize(RowDeserializer { row, options }).map_err(|err| match err {
        DecodeError::MissingKey(field) => {
            DecodeError::MissingKey(options.column_for_field(&field))
        }
        other => other,
    })
}

struct RowDeserializer<'a> {
    row: &'a Row,
    options: &'a DecoderOptions,
}

impl<'a> RowDeserializer<'a> {
    fn single_column(&self) -> Result<ColumnDeserializer<'a>, DecodeError> {
        match self.row.values.as_slice() {
            [value] => Ok(ColumnDeserializer {
                column: self.row.column_names.first().map_or("", String::as_str),
                value,
            }),
            values => Err(DecodeError::TypeMismatch {
                column: "<row>".into(),
                expected: "a single column".into(),
                found: format!("{} columns", values.len()),
            }),
        }
    }

    fn positional(&self) -> ColumnSeq<'a> {
        ColumnSeq {
            names: &self.row.column_names,
            values: self.row.values.iter().enumerate(),
        }
    }
}

macro_rules! forward_to_single_column {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
                self.single_column()?.$method(visitor)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for RowDeserializer<'_> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_map(visitor)
    }

    forward_to_single_column! {
        deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64 deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf deserialize_unit deserialize_identifier
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.row.values.as_slice() {
            [] | [ColumnValue::Null] => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_seq(self.positional())
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_map(ColumnMap {
            row: self.row,
            options: self.options,
            next: 0,
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_map(FieldMap {
            row: self.row,
            options: self.options,
            fields: fields.iter(),
            pending: None,
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.single_column()?.deserialize_enum(name, variants, visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }
}

/// Yields declared fields that have a column; absent ones are left to
/// serde's missing-field handling.
struct FieldMap<'a> {
    row: &'a Row,
    options: &'a DecoderOptions,
    fields: std::slice::Iter<'static, &'static str>,
    pending: Option<(String, usize)>,
}

impl<'de> MapAccess<'de> for FieldMap<'_> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        for field in self.fields.by_ref() {
            let column = self.options.column_for_field(field);
            if let Some(idx) = self.row.get_column_index(&column) {
                self.pending = Some((column, idx));
                let key: StrDeserializer<'_, DecodeError> = (*field).into_deserializer();
                return seed.deserialize(key).map(Some);
            }
        }
        Ok(None)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, DecodeError> {
        let (column, idx) = self
            .pending
            .take()
            .ok_or_else(|| DecodeError::Message("value requested before key".into()))?;
        let value = self
            .row
            .get_by_index(idx)
            .ok_or_else(|| DecodeError::MissingKey(column.clone()))?;
        seed.deserialize(ColumnDeserializer {
            column: &column,
            value,
        })
    }
}

/// Every column, keyed by its field name.
struct ColumnMap<'a> {
    row: &'a Row,
    options: &'a DecoderOptions,
    next: usize,
}

impl<'de> MapAccess<'de> for ColumnMap<'_> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        let Some(column) = self.row.column_names.get(self.next) else {
            return Ok(None);
        };
        let key: StringDeserializer<DecodeError> =
            self.options.field_for_column(column).into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, DecodeError> {
        let idx = self.next;
        self.next += 1;
        let column = self.row.column_names.get(idx).map_or("", String::as_str);
        let value = self
            .row
            .get_by_index(idx)
            .ok_or_else(|| DecodeError::MissingKey(column.to_string()))?;
        seed.deserialize(ColumnDeserializer { column, value })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.row.len().saturating_sub(self.next))
    }
}

/// Columns in order, for tuple targets.
struct ColumnSeq<'a> {
    names: &'a [String],
    values: std::iter::Enumerate<std::slice::Iter<'a, ColumnValue>>,
}

impl<'de> SeqAccess<'de> for ColumnSeq<'_> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DecodeError> {
        match self.values.next() {
            Some((idx, value)) => {
                let column = self.names.get(idx).map_or("", String::as_str);
                seed.deserialize(ColumnDeserializer { column, value }).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Elements of a native array column.
struct ArrayElements<'a> {
    column: &'a str,
    items: std::slice::Iter<'a, ColumnValue>,
}

impl<'de> SeqAccess<'de> for ArrayElements<'_> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DecodeError> {
        match self.items.next() {
            Some(value) => seed
                .deserialize(ColumnDeserializer {
                    column: self.column,
                    value,
                })
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct ColumnDeserializer<'a> {
    column: &'a str,
    value: &'a ColumnValue,
}

impl ColumnDeserializer<'_> {
    fn mismatch(&self, expected: &str) -> DecodeError {
        DecodeError::TypeMismatch {
            column: self.column.to_string(),
            expected: expected.to_string(),
            found: self.value.type_name(),
        }
    }

    /// Parse the column as a JSON document, if its physical kind can hold one.
    fn document(&self, expected: &str) -> Result<JsonValue, DecodeError> {
        match self.value {
            ColumnValue::Json(doc) => Ok(doc.clone()),
            ColumnValue::Text(text) => {
                serde_json::from_str(text).map_err(|_| self.mismatch(expected))
            }
            ColumnValue::Blob(bytes) => {
                serde_json::from_slice(bytes).map_err(|_| self.mismatch(expected))
            }
            ColumnValue::Other { type_name } => Err(DecodeError::UnsupportedColumnType {
                column: self.column.to_string(),
                found: type_name.clone(),
            }),
            _ => Err(self.mismatch(expected)),
        }
    }

    /// Second attempt: deserialize the target from the column's JSON document.
    fn json_fallback<'de, V, F>(
        &self,
        expected: &str,
        visitor: V,
        read: F,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
        F: FnOnce(JsonValue, V) -> Result<V::Value, serde_json::Error>,
    {
        let doc = self.document(expected)?;
        read(doc, visitor).map_err(|e| DecodeError::TypeMismatch {
            column: self.column.to_string(),
            expected: expected.to_string(),
            found: format!("json ({e})"),
        })
    }

    fn temporal_text(&self) -> Option<String> {
        match self.value {
            ColumnValue::Timestamp(ts) => Some(ts.format(TIMESTAMP_FORMAT).to_string()),
            ColumnValue::TimestampTz(ts) => Some(ts.to_rfc3339()),
            ColumnValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            ColumnValue::Uuid(id) => Some(id.hyphenated().to_string()),
            _ => None,
        }
    }
}

macro_rules! deserialize_integer {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
                match self.value {
                    ColumnValue::Int(i) => visitor.visit_i64(*i),
                    _ => self.json_fallback("integer", visitor, |doc, v| doc.$method(v)),
                }
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ColumnDeserializer<'_> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        if let Some(text) = self.temporal_text() {
            return visitor.visit_string(text);
        }
        match self.value {
            ColumnValue::Null => visitor.visit_unit(),
            ColumnValue::Bool(b) => visitor.visit_bool(*b),
            ColumnValue::Int(i) => visitor.visit_i64(*i),
            ColumnValue::Float(f) => visitor.visit_f64(*f),
            ColumnValue::Text(s) => visitor.visit_str(s),
            ColumnValue::Blob(b) => visitor.visit_bytes(b),
            ColumnValue::Json(doc) => doc
                .clone()
                .deserialize_any(visitor)
                .map_err(|e| DecodeError::Message(e.to_string())),
            ColumnValue::Array(items) => visitor.visit_seq(ArrayElements {
                column: self.column,
                items: items.iter(),
            }),
            ColumnValue::Other { type_name } => Err(DecodeError::UnsupportedColumnType {
                column: self.column.to_string(),
                found: type_name.clone(),
            }),
            ColumnValue::Timestamp(_)
            | ColumnValue::TimestampTz(_)
            | ColumnValue::Date(_)
            | ColumnValue::Uuid(_) => Err(self.mismatch("any")),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            ColumnValue::Bool(b) => visitor.visit_bool(*b),
            ColumnValue::Int(0) => visitor.visit_bool(false),
            ColumnValue::Int(1) => visitor.visit_bool(true),
            _ => self.json_fallback("bool", visitor, |doc, v| doc.deserialize_bool(v)),
        }
    }

    deserialize_integer! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            ColumnValue::Float(f) => visitor.visit_f64(*f),
            ColumnValue::Int(i) => visitor.visit_i64(*i),
            _ => self.json_fallback("float", visitor, |doc, v| doc.deserialize_f64(v)),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        if let Some(text) = self.temporal_text() {
            return visitor.visit_string(text);
        }
        match self.value {
            ColumnValue::Text(s) => visitor.visit_str(s),
            _ => self.json_fallback("text", visitor, |doc, v| doc.deserialize_str(v)),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            ColumnValue::Blob(b) => visitor.visit_bytes(b),
            ColumnValue::Text(s) => visitor.visit_bytes(s.as_bytes()),
            ColumnValue::Uuid(id) => visitor.visit_bytes(id.as_bytes()),
            _ => self.json_fallback("bytes", visitor, |doc, v| doc.deserialize_bytes(v)),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            ColumnValue::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            ColumnValue::Null => visitor.visit_unit(),
            _ => Err(self.mismatch("null")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            ColumnValue::Array(items) => visitor.visit_seq(ArrayElements {
                column: self.column,
                items: items.iter(),
            }),
            // Blobs are always their raw bytes; JSON documents arrive as text.
            ColumnValue::Blob(bytes) => {
                let raw = SeqDeserializer::<_, DecodeError>::new(bytes.iter().copied());
                visitor.visit_seq(raw)
            }
            _ => self.json_fallback("sequence", visitor, |doc, v| doc.deserialize_seq(v)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.json_fallback("map", visitor, |doc, v| doc.deserialize_map(v))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.json_fallback("struct", visitor, |doc, v| {
            doc.deserialize_struct(name, fields, v)
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        match self.value {
            ColumnValue::Text(s) if !s.trim_start().starts_with(['{', '"']) => {
                let variant: StrDeserializer<'_, DecodeError> = s.as_str().into_deserializer();
                visitor.visit_enum(variant)
            }
            _ => self.json_fallback("enum", visitor, |doc, v| {
                doc.deserialize_enum(name, variants, v)
            }),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }
}
