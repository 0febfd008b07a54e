use std::fmt;
use std::sync::Arc;

use convert_case::{Boundary, Case, Converter};

/// Caller-supplied key mapping.
pub type KeyMapper = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How field names become column names when encoding.
#[derive(Clone, Default)]
pub enum KeyEncodingStrategy {
    /// Field names are used as-is.
    #[default]
    UseDefaultKeys,
    /// `camelCase` field names become `snake_case` columns.
    ConvertToSnakeCase,
    Custom(KeyMapper),
}

/// How declared field names are matched to column names when decoding.
#[derive(Clone, Default)]
pub enum KeyDecodingStrategy {
    #[default]
    UseDefaultKeys,
    /// Columns are `snake_case`, fields are `camelCase`.
    ConvertFromSnakeCase,
    Custom(KeyMapper),
}

impl fmt::Debug for KeyEncodingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseDefaultKeys => f.write_str("UseDefaultKeys"),
            Self::ConvertToSnakeCase => f.write_str("ConvertToSnakeCase"),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

impl fmt::Debug for KeyDecodingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UseDefaultKeys => f.write_str("UseDefaultKeys"),
            Self::ConvertFromSnakeCase => f.write_str("ConvertFromSnakeCase"),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

impl KeyEncodingStrategy {
    /// Column name for a field, before any prefix is applied.
    #[must_use]
    pub fn apply(&self, key: &str) -> String {
        match self {
            Self::UseDefaultKeys => key.to_string(),
            Self::ConvertToSnakeCase => convert_to_snake_case(key),
            Self::Custom(mapper) => mapper(key),
        }
    }
}

impl KeyDecodingStrategy {
    /// Column name to read for a declared field, before any prefix is applied.
    #[must_use]
    pub fn column_for_field(&self, field: &str) -> String {
        match self {
            Self::UseDefaultKeys => field.to_string(),
            Self::ConvertFromSnakeCase => convert_to_snake_case(field),
            Self::Custom(mapper) => mapper(field),
        }
    }

    /// Field name for a column, used when decoding into maps.
    #[must_use]
    pub fn field_for_column(&self, column: &str) -> String {
        match self {
            Self::ConvertFromSnakeCase => convert_from_snake_case(column),
            Self::UseDefaultKeys | Self::Custom(_) => column.to_string(),
        }
    }
}

/// `myURLProperty` -> `my_url_property`.
///
/// Words split where a lowercase letter or digit meets an uppercase one, and
/// before the last capital of an acronym that runs into a word. Existing
/// underscores are left alone.
#[must_use]
pub fn convert_to_snake_case(key: &str) -> String {
    Converter::new()
        .set_boundaries(&[Boundary::LowerUpper, Boundary::DigitUpper, Boundary::Acronym])
        .to_case(Case::Snake)
        .convert(key)
}

/// `my_url_property` -> `myUrlProperty`.
///
/// Leading and trailing underscores are kept.
#[must_use]
pub fn convert_from_snake_case(key: &str) -> String {
    let trimmed = key.trim_matches('_');
    if !trimmed.contains('_') {
        return key.to_string();
    }
    let leading = key.len() - key.trim_start_matches('_').len();
    let trailing = key.len() - key.trim_end_matches('_').len();

    let camel = Converter::new()
        .set_boundaries(&[Boundary::Underscore])
        .to_case(Case::Camel)
        .convert(trimmed);
    format!("{}{camel}{}", &key[..leading], &key[key.len() - trailing..])
}
