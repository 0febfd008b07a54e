use serde::Serialize;

use crate::codec::to_value;
use crate::error::EncodeError;
use crate::types::Value;

/// A SQL template and its bindings bundled together.
///
/// The template may use `?` for the next binding and `:name:` for a field
/// of any record binding (or `:N:` for the binding at index `N`):
/// ```rust
/// use sql_template_middleware::prelude::*;
///
/// let q = Query::new("INSERT INTO todos (id, title) VALUES (?, ?)")
///     .bind(1_i64)
///     .bind("write docs");
/// # let _ = q;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    template: String,
    bindings: Vec<Value>,
}

impl Query {
    /// Create a new `Query` with no bindings
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            bindings: Vec::new(),
        }
    }

    /// Create a new `Query` with the given template and bindings
    pub fn with_bindings(template: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            template: template.into(),
            bindings,
        }
    }

    /// Build from format-style text: each `{}` becomes a `?` placeholder and
    /// `{{`/`}}` are literal braces. Used by [`query!`](crate::query!).
    #[must_use]
    pub fn interpolate(format: &str, bindings: Vec<Value>) -> Self {
        let mut template = String::with_capacity(format.len());
        let mut chars = format.chars().peekable();
        while let Some(c) = chars.next() {
            match (c, chars.peek()) {
                ('{', Some('}')) => {
                    chars.next();
                    template.push('?');
                }
                ('{', Some('{')) | ('}', Some('}')) => {
                    chars.next();
                    template.push(c);
                }
                _ => template.push(c),
            }
        }
        Self { template, bindings }
    }

    /// Append a binding.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.bindings.push(value.into());
        self
    }

    /// Append any serializable value; structs become record bindings.
    ///
    /// # Errors
    /// Returns `EncodeError::UnsupportedValue` if `value` cannot be reflected.
    pub fn bind_serialize<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, EncodeError> {
        self.bindings.push(to_value(value)?);
        Ok(self)
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn bindings(&self) -> &[Value] {
        &self.bindings
    }
}

impl From<&str> for Query {
    fn from(template: &str) -> Self {
        Query::new(template)
    }
}

impl From<String> for Query {
    fn from(template: String) -> Self {
        Query::new(template)
    }
}

/// Build a [`Query`] with `{}` standing in for each argument.
///
/// ```rust
/// use sql_template_middleware::query;
///
/// let q = query!("INSERT INTO t (a, b) VALUES ({}, {})", 42_i64, "six");
/// assert_eq!(q.template(), "INSERT INTO t (a, b) VALUES (?, ?)");
/// assert_eq!(q.bindings().len(), 2);
/// ```
#[macro_export]
macro_rules! query {
    ($template:expr $(,)?) => {
        $crate::query::Query::new($template)
    };
    ($template:expr, $($arg:expr),+ $(,)?) => {
        $crate::query::Query::interpolate(
            $template,
            vec![$($crate::types::Value::from($arg)),+],
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        foo: i32,
    }

    #[test]
    fn interpolation_turns_arguments_into_placeholders() {
        let q = crate::query!("VALUES ({}), ({})", 42_i32, 6_i32);
        assert_eq!(q.template(), "VALUES (?), (?)");
        assert_eq!(q.bindings(), &[Value::from(42_i32), Value::from(6_i32)]);
    }

    #[test]
    fn doubled_braces_stay_literal() {
        let q = Query::interpolate("SELECT '{{}}', {}", vec![Value::from(1_i64)]);
        assert_eq!(q.template(), "SELECT '{}', ?");
    }

    #[test]
    fn bind_serialize_adds_a_record() {
        let q = Query::new("(:foo:)")
            .bind(6_i32)
            .bind_serialize(&Sample { foo: 42 })
            .unwrap();
        assert_eq!(q.bindings().len(), 2);
        assert!(q.bindings()[1].is_record());
    }
}
