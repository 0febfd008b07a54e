//! Query templates: `?` and `:key:` placeholders rewritten to native syntax.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

mod scanner;

pub use scanner::Segment;
use scanner::{binding_index, scan};

use crate::backend::Backend;
use crate::codec::encode::encode_at;
use crate::codec::{ColumnKey, EncoderOptions, encode_binding};
use crate::error::{BindingError, EncodeError, SqlMiddlewareDbError};
use crate::query::Query;
use crate::types::Value;

/// Native SQL plus its bound values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared<N> {
    pub sql: String,
    pub params: Vec<N>,
}

/// A parsed template. Depends only on the template text, so it can be
/// cached and resolved against any bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
    literal_len: usize,
    placeholders: usize,
}

impl Template {
    /// Parse template text.
    ///
    /// # Errors
    /// Returns `BindingError::UnterminatedPlaceholder` if a `:key` is left open.
    pub fn parse(sql: &str) -> Result<Self, BindingError> {
        let segments = scan(sql)?;
        let mut literal_len = 0;
        let mut placeholders = 0;
        for segment in &segments {
            match segment {
                Segment::Literal(text) => literal_len += text.len(),
                Segment::Next | Segment::Key(_) => placeholders += 1,
            }
        }
        Ok(Self {
            segments,
            literal_len,
            placeholders,
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of native placeholders the template will emit.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Rewrite placeholders for backend `B` and encode their values.
    ///
    /// `?` takes the binding at a cursor that advances on every `?`; a
    /// missing binding binds NULL. `:key:` looks in the pattern map built
    /// from record bindings, then treats a numeric key as a binding index,
    /// then binds NULL. Native positions count every emitted placeholder.
    ///
    /// # Errors
    /// Returns `EncodeError` if a binding cannot be encoded. Nothing partial
    /// is returned.
    pub fn resolve<B: Backend>(
        &self,
        bindings: &[Value],
        options: &EncoderOptions,
    ) -> Result<Prepared<B::Native>, EncodeError> {
        let patterns = pattern_map::<B>(bindings, options)?;
        let mut sql = String::with_capacity(self.literal_len + self.placeholders * 4);
        let mut params = Vec::with_capacity(self.placeholders);
        let mut cursor = 0;

        for segment in &self.segments {
            let native = match segment {
                Segment::Literal(text) => {
                    sql.push_str(text);
                    continue;
                }
                Segment::Next => {
                    let native = match bindings.get(cursor) {
                        Some(value) => encode_binding::<B>(value)?,
                        None => B::null(),
                    };
                    cursor += 1;
                    native
                }
                Segment::Key(key) => {
                    if let Some(native) = patterns.get(key.as_str()) {
                        native.clone()
                    } else if let Some(value) = binding_index(key).and_then(|i| bindings.get(i)) {
                        encode_binding::<B>(value)?
                    } else {
                        B::null()
                    }
                }
            };
            B::write_placeholder(&mut sql, params.len() + 1);
            params.push(native);
        }

        Ok(Prepared { sql, params })
    }
}

/// Field name to encoded value, over every record binding. Later bindings
/// overwrite earlier ones.
fn pattern_map<B: Backend>(
    bindings: &[Value],
    options: &EncoderOptions,
) -> Result<HashMap<String, B::Native>, EncodeError> {
    let mut patterns = HashMap::new();
    for (position, binding) in bindings.iter().enumerate() {
        if !binding.is_record() {
            continue;
        }
        for (key, native) in encode_at::<B>(binding, position, options)? {
            if let ColumnKey::Name(name) = key {
                patterns.insert(name, native);
            }
        }
    }
    Ok(patterns)
}

/// Parses keyed by template text.
///
/// Once `max_entries` is reached the cache is cleared before the next insert.
#[derive(Debug)]
pub struct TemplateCache {
    entries: Mutex<HashMap<String, Arc<Template>>>,
    max_entries: usize,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(512)
    }
}

impl TemplateCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Cached parse of `sql`, parsing on first use.
    ///
    /// # Errors
    /// Returns the parse error; failed parses are not cached.
    pub fn get_or_parse(&self, sql: &str) -> Result<Arc<Template>, BindingError> {
        if let Some(hit) = self.lock().get(sql) {
            tracing::trace!(len = sql.len(), "template cache hit");
            return Ok(Arc::clone(hit));
        }
        let parsed = Arc::new(Template::parse(sql)?);
        let mut entries = self.lock();
        if entries.len() >= self.max_entries {
            entries.clear();
        }
        entries.insert(sql.to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Template>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            // A panic mid-insert leaves only valid entries behind.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Parse (through `cache` when given) and resolve a query for backend `B`.
///
/// # Errors
/// Returns `SqlMiddlewareDbError::BindingError` for malformed templates and
/// `SqlMiddlewareDbError::EncodeError` for bindings that cannot be encoded.
pub fn resolve_query<B: Backend>(
    query: &Query,
    options: &EncoderOptions,
    cache: Option<&TemplateCache>,
) -> Result<Prepared<B::Native>, SqlMiddlewareDbError> {
    let template = match cache {
        Some(cache) => cache.get_or_parse(query.template())?,
        None => Arc::new(Template::parse(query.template())?),
    };
    let prepared = template.resolve::<B>(query.bindings(), options)?;
    tracing::debug!(
        backend = B::NAME,
        placeholders = prepared.params.len(),
        bindings = query.bindings().len(),
        "resolved query template"
    );
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode::tests::TestBackend;
    use crate::codec::{KeyEncodingStrategy, NilEncodingStrategy};
    use serde::Serialize;
    use uuid::Uuid;

    fn resolve(sql: &str, bindings: Vec<Value>) -> Prepared<Value> {
        Template::parse(sql)
            .unwrap()
            .resolve::<TestBackend>(&bindings, &EncoderOptions::new())
            .unwrap()
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let sql = "SELECT id, title FROM todos ORDER BY id";
        let prepared = resolve(sql, vec![Value::from(1_i64)]);
        assert_eq!(prepared.sql, sql);
        assert!(prepared.params.is_empty());
    }

    #[test]
    fn named_fields_of_a_record() {
        let record = Value::record([("a", Value::from(1_i64)), ("b", Value::from("x"))]);
        let prepared = resolve("INSERT INTO t (a,b) VALUES (:a:, :b:)", vec![record]);
        assert_eq!(prepared.sql, "INSERT INTO t (a,b) VALUES ($1, $2)");
        assert_eq!(prepared.params, vec![Value::from(1_i64), Value::from("x")]);
    }

    #[test]
    fn question_marks_consume_bindings_in_order() {
        let prepared = resolve(
            "VALUES (?), (?), (?)",
            vec![Value::from(42_i32), Value::from("six"), Value::from(true)],
        );
        assert_eq!(prepared.sql, "VALUES ($1), ($2), ($3)");
        assert_eq!(
            prepared.params,
            vec![Value::from(42_i32), Value::from("six"), Value::from(true)]
        );
    }

    #[test]
    fn missing_positional_binding_is_null() {
        let prepared = resolve("VALUES (?, ?)", vec![Value::from(1_i64)]);
        assert_eq!(prepared.params, vec![Value::from(1_i64), Value::Null]);
    }

    #[test]
    fn numeric_keys_fall_back_to_positions_and_names_resolve_from_records() {
        #[derive(Serialize)]
        struct Extra {
            title: String,
            url: String,
        }
        let id = Uuid::new_v4();
        let extra = crate::codec::to_value(&Extra {
            title: "from record".into(),
            url: "https://example.com".into(),
        })
        .unwrap();
        let bindings = vec![
            Value::from(id),
            Value::from("title"),
            Value::from("url"),
            Value::from(12_i64),
            extra,
        ];
        let prepared = resolve(
            "INSERT INTO todos (id, kind, title, url) VALUES (:0:, :1:, :title:, :url:)",
            bindings,
        );
        assert_eq!(
            prepared.sql,
            "INSERT INTO todos (id, kind, title, url) VALUES ($1, $2, $3, $4)"
        );
        assert_eq!(
            prepared.params,
            vec![
                Value::from(id),
                Value::from("title"),
                Value::from("from record"),
                Value::from("https://example.com"),
            ]
        );
    }

    #[test]
    fn record_field_beats_positional_fallback() {
        let record = Value::record([("0", Value::from("named"))]);
        let prepared = resolve("SELECT :0:", vec![Value::from("positional"), record]);
        assert_eq!(prepared.params, vec![Value::from("named")]);
    }

    #[test]
    fn later_record_overrides_earlier_field() {
        let first = Value::record([("id", Value::from(1_i64))]);
        let second = Value::record([("id", Value::from(2_i64))]);
        let prepared = resolve("WHERE id = :id:", vec![first, second]);
        assert_eq!(prepared.params, vec![Value::from(2_i64)]);
    }

    #[test]
    fn unknown_key_binds_null() {
        let prepared = resolve("WHERE a = :nope: AND b = :99:", vec![Value::from(1_i64)]);
        assert_eq!(prepared.sql, "WHERE a = $1 AND b = $2");
        assert_eq!(prepared.params, vec![Value::Null, Value::Null]);
    }

    #[test]
    fn mixed_styles_share_native_numbering() {
        let record = Value::record([("name", Value::from("kim"))]);
        let prepared = resolve(
            "UPDATE t SET name = :name: WHERE id = ?",
            vec![Value::from(7_i64), record],
        );
        assert_eq!(prepared.sql, "UPDATE t SET name = $1 WHERE id = $2");
        assert_eq!(prepared.params, vec![Value::from("kim"), Value::from(7_i64)]);
    }

    #[test]
    fn question_mark_on_a_record_binds_it_as_json() {
        let record = Value::record([("a", Value::from(1_i64))]);
        let prepared = resolve("VALUES (?)", vec![record]);
        assert_eq!(prepared.params, vec![Value::Text(r#"json:{"a":1}"#.into())]);
    }

    #[test]
    fn unterminated_key_fails_whole_parse() {
        for sql in ["SELECT :a", "SELECT ?, :b: , :c", ":"] {
            let err = Template::parse(sql).unwrap_err();
            assert!(matches!(err, BindingError::UnterminatedPlaceholder { .. }));
        }
    }

    #[test]
    fn pattern_keys_follow_encoder_options() {
        let record = Value::record([("createdAt", Value::from("now")), ("note", Value::Null)]);
        let options = EncoderOptions::new()
            .key_encoding(KeyEncodingStrategy::ConvertToSnakeCase)
            .nil_encoding(NilEncodingStrategy::SkipColumn);
        let prepared = Template::parse("VALUES (:created_at:, :note:)")
            .unwrap()
            .resolve::<TestBackend>(&[record], &options)
            .unwrap();
        assert_eq!(prepared.params, vec![Value::from("now"), Value::Null]);
    }

    #[test]
    fn cache_reuses_parses() {
        let cache = TemplateCache::new(2);
        let a = cache.get_or_parse("SELECT ?").unwrap();
        let b = cache.get_or_parse("SELECT ?").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        cache.get_or_parse("SELECT 1").unwrap();
        cache.get_or_parse("SELECT 2").unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get_or_parse("SELECT :x").is_err());
    }

    #[test]
    fn resolve_query_uses_query_bindings() {
        let query = Query::new("SELECT ? + ?").bind(1_i32).bind(2_i32);
        let prepared =
            resolve_query::<TestBackend>(&query, &EncoderOptions::new(), None).unwrap();
        assert_eq!(prepared.sql, "SELECT $1 + $2");
        assert_eq!(prepared.params.len(), 2);
    }
}
