//! `serde::Serialize` to [`Value`] conversion.
//!
//! Any `#[derive(Serialize)]` struct becomes a [`Value::Record`] whose field
//! order matches declaration order. Enums follow serde's externally tagged
//! layout: unit variants become text, data-carrying variants become a
//! one-field record named after the variant.

use serde::ser::{self, Serialize};

use crate::error::EncodeError;
use crate::types::{Integer, Value};

/// Convert any serializable value into a [`Value`].
///
/// # Errors
/// Returns `EncodeError::UnsupportedValue` when a map key is not a string
/// or integer, or when the value's own `Serialize` impl fails.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, EncodeError> {
    value.serialize(ValueSerializer)
}

pub struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = EncodeError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = VariantBuilder<SeqBuilder>;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = VariantBuilder<MapBuilder>;

    fn serialize_bool(self, v: bool) -> Result<Value, EncodeError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, EncodeError> {
        Ok(Value::Int(Integer::I8(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, EncodeError> {
        Ok(Value::Int(Integer::I16(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, EncodeError> {
        Ok(Value::Int(Integer::I32(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, EncodeError> {
        Ok(Value::Int(Integer::I64(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, EncodeError> {
        Ok(Value::Int(Integer::U8(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, EncodeError> {
        Ok(Value::Int(Integer::U16(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, EncodeError> {
        Ok(Value::Int(Integer::U32(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, EncodeError> {
        Ok(Value::Int(Integer::U64(v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, EncodeError> {
        Ok(Value::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, EncodeError> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, EncodeError> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, EncodeError> {
        Ok(Value::Text(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, EncodeError> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, EncodeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, EncodeError> {
        Ok(Value::Text(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, EncodeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, EncodeError> {
        Ok(Value::Record(vec![(variant.to_string(), to_value(value)?)]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, EncodeError> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, EncodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, EncodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantBuilder<SeqBuilder>, EncodeError> {
        Ok(VariantBuilder {
            variant,
            inner: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, EncodeError> {
        Ok(MapBuilder {
            fields: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapBuilder, EncodeError> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantBuilder<MapBuilder>, EncodeError> {
        Ok(VariantBuilder {
            variant,
            inner: self.serialize_map(Some(len))?,
        })
    }
}

pub struct SeqBuilder {
    items: Vec<Value>,
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Seq(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        ser::SerializeSeq::end(self)
    }
}

pub struct MapBuilder {
    fields: Vec<(String, Value)>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), EncodeError> {
        let key = match to_value(key)? {
            Value::Text(s) => s,
            Value::Int(Integer::U64(n)) => n.to_string(),
            Value::Int(i) => i.as_i64().unwrap_or_default().to_string(),
            other => {
                return Err(EncodeError::UnsupportedValue(format!(
                    "map key must be a string or integer, got {}",
                    other.kind()
                )));
            }
        };
        self.pending_key = Some(key);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        let key = self.pending_key.take().ok_or_else(|| {
            EncodeError::UnsupportedValue("map value serialized before its key".into())
        })?;
        self.fields.push((key, to_value(value)?));
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Record(self.fields))
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        self.fields.push((key.to_string(), to_value(value)?));
        Ok(())
    }

    fn skip_field(&mut self, _key: &'static str) -> Result<(), EncodeError> {
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        ser::SerializeMap::end(self)
    }
}

/// Wraps a tuple or struct variant body in a one-field record.
pub struct VariantBuilder<B> {
    variant: &'static str,
    inner: B,
}

impl ser::SerializeTupleVariant for VariantBuilder<SeqBuilder> {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        ser::SerializeSeq::serialize_element(&mut self.inner, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        let body = ser::SerializeSeq::end(self.inner)?;
        Ok(Value::Record(vec![(self.variant.to_string(), body)]))
    }
}

impl ser::SerializeStructVariant for VariantBuilder<MapBuilder> {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        let body = ser::SerializeMap::end(self.inner)?;
        Ok(Value::Record(vec![(self.variant.to_string(), body)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Todo {
        id: i64,
        title: String,
        order: Option<i32>,
        tags: Vec<String>,
    }

    #[derive(Serialize)]
    enum Status {
        Open,
        Closed { reason: String },
    }

    #[test]
    fn struct_becomes_ordered_record() {
        let todo = Todo {
            id: 1,
            title: "write".into(),
            order: None,
            tags: vec!["a".into()],
        };
        let value = to_value(&todo).unwrap();
        let Value::Record(fields) = value else {
            panic!("expected record");
        };
        let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["id", "title", "order", "tags"]);
        assert_eq!(fields[0].1, Value::Int(Integer::I64(1)));
        assert_eq!(fields[2].1, Value::Null);
        assert_eq!(fields[3].1, Value::Seq(vec![Value::Text("a".into())]));
    }

    #[test]
    fn enums_use_external_tagging() {
        assert_eq!(to_value(&Status::Open).unwrap(), Value::Text("Open".into()));
        let closed = to_value(&Status::Closed {
            reason: "done".into(),
        })
        .unwrap();
        assert_eq!(
            closed.field("Closed").and_then(|b| b.field("reason")),
            Some(&Value::Text("done".into()))
        );
    }

    #[test]
    fn integer_map_keys_become_text() {
        let mut map = BTreeMap::new();
        map.insert(3_u8, "three");
        let value = to_value(&map).unwrap();
        assert_eq!(value.field("3"), Some(&Value::Text("three".into())));
    }

    #[test]
    fn rejects_structured_map_keys() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), "pair");
        let err = to_value(&map).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedValue(_)));
    }
}
