//! Value codec: application values to backend columns and back.

pub mod decode;
pub mod encode;
pub mod keys;
pub mod ser;

pub use decode::decode_row;
pub use encode::{ColumnKey, NativeConversion, encode, encode_binding, encode_value};
pub use keys::{KeyDecodingStrategy, KeyEncodingStrategy, KeyMapper};
pub use ser::to_value;

/// What to do with a record field whose value is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NilEncodingStrategy {
    /// Leave the column out of the encoded output.
    #[default]
    SkipColumn,
    /// Emit the column with a native null.
    EncodeAsNull,
}

/// Options for one encode call.
#[derive(Debug, Clone, Default)]
pub struct EncoderOptions {
    pub prefix: Option<String>,
    pub key_encoding: KeyEncodingStrategy,
    pub nil_encoding: NilEncodingStrategy,
}

impl EncoderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn key_encoding(mut self, strategy: KeyEncodingStrategy) -> Self {
        self.key_encoding = strategy;
        self
    }

    #[must_use]
    pub fn nil_encoding(mut self, strategy: NilEncodingStrategy) -> Self {
        self.nil_encoding = strategy;
        self
    }

    /// Column name for a record field: prefix followed by the converted key.
    #[must_use]
    pub fn column_name(&self, field: &str) -> String {
        let key = self.key_encoding.apply(field);
        match &self.prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key,
        }
    }
}

/// Options for decoding rows.
#[derive(Debug, Clone, Default)]
pub struct DecoderOptions {
    pub prefix: Option<String>,
    pub key_decoding: KeyDecodingStrategy,
}

impl DecoderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn key_decoding(mut self, strategy: KeyDecodingStrategy) -> Self {
        self.key_decoding = strategy;
        self
    }

    /// Column that holds a declared struct field.
    #[must_use]
    pub fn column_for_field(&self, field: &str) -> String {
        let key = self.key_decoding.column_for_field(field);
        match &self.prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key,
        }
    }

    /// Map key for a returned column.
    #[must_use]
    pub fn field_for_column(&self, column: &str) -> String {
        let unprefixed = self
            .prefix
            .as_deref()
            .and_then(|p| column.strip_prefix(p))
            .unwrap_or(column);
        self.key_decoding.field_for_column(unprefixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_applies_after_key_strategy() {
        let opts = EncoderOptions::new()
            .prefix("todo_")
            .key_encoding(KeyEncodingStrategy::ConvertToSnakeCase);
        assert_eq!(opts.column_name("createdAt"), "todo_created_at");

        let dec = DecoderOptions::new()
            .prefix("todo_")
            .key_decoding(KeyDecodingStrategy::ConvertFromSnakeCase);
        assert_eq!(dec.column_for_field("createdAt"), "todo_created_at");
        assert_eq!(dec.field_for_column("todo_created_at"), "createdAt");
        assert_eq!(dec.field_for_column("other_col"), "otherCol");
    }
}
