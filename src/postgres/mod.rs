// PostgreSQL backend: `$N` placeholders, `PgValue` parameters bound through
// `ToSql`, row extraction into `ColumnValue`, and a bb8 pool manager.

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{PgManager, PostgresOptions};
pub use executor::{execute_prepared, fetch_prepared};
pub use params::PgValue;
pub use query::{build_result_set, postgres_extract_value};

use crate::backend::{Backend, write_numbered};
use crate::codec::NativeConversion;
use crate::types::Value;

/// Marker for the PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Backend for Postgres {
    type Native = PgValue;

    const NAME: &'static str = "postgres";

    fn write_placeholder(out: &mut String, position: usize) {
        write_numbered(out, '$', position);
    }

    fn to_native(value: &Value) -> NativeConversion<PgValue> {
        PgValue::from_value(value)
    }

    fn json_column(document: Vec<u8>) -> PgValue {
        PgValue::Json(document)
    }

    fn null() -> PgValue {
        PgValue::Null
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;
    use crate::codec::EncoderOptions;
    use crate::query::Query;
    use crate::template::resolve_query;

    #[derive(Serialize)]
    struct Todo {
        id: i64,
        title: String,
        tags: Vec<String>,
    }

    #[test]
    fn resolves_to_dollar_placeholders() {
        let query = Query::new("UPDATE todos SET title = :title: WHERE id = :id:")
            .bind_serialize(&Todo {
                id: 3,
                title: "ship".into(),
                tags: vec!["a".into()],
            })
            .unwrap();
        let prepared = resolve_query::<Postgres>(&query, &EncoderOptions::new(), None).unwrap();
        assert_eq!(prepared.sql, "UPDATE todos SET title = $1 WHERE id = $2");
        assert_eq!(
            prepared.params,
            vec![PgValue::Text("ship".into()), PgValue::Int(crate::types::Integer::I64(3))]
        );
    }

    #[test]
    fn string_sequences_bind_as_arrays_and_records_as_json() {
        let query = Query::new("SELECT ?, ?")
            .bind(vec!["a", "b"])
            .bind(Value::record([("k", Value::from(1_i64))]));
        let prepared = resolve_query::<Postgres>(&query, &EncoderOptions::new(), None).unwrap();
        assert_eq!(prepared.sql, "SELECT $1, $2");
        assert_eq!(
            prepared.params[0],
            PgValue::Array(vec![PgValue::Text("a".into()), PgValue::Text("b".into())])
        );
        assert_eq!(prepared.params[1], PgValue::Json(br#"{"k":1}"#.to_vec()));
    }
}
