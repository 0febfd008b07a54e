// SQLite backend: `?` placeholders, values mapped onto SQLite storage
// classes, and a bb8 pool whose connections are driven on the blocking pool.

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteManager, SqliteOptions, SqliteOptionsBuilder};
pub use executor::{execute_prepared, fetch_prepared, run_blocking};
pub use params::to_sqlite_value;
pub use query::{build_result_set, sqlite_extract_value_sync};

use rusqlite::types::Value as SqlValue;

use crate::backend::Backend;
use crate::codec::NativeConversion;
use crate::types::Value;

/// Marker for the `SQLite` dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Backend for Sqlite {
    type Native = SqlValue;

    const NAME: &'static str = "sqlite";

    fn write_placeholder(out: &mut String, _position: usize) {
        out.push('?');
    }

    fn to_native(value: &Value) -> NativeConversion<SqlValue> {
        to_sqlite_value(value)
    }

    fn json_column(document: Vec<u8>) -> SqlValue {
        // serde_json only emits UTF-8.
        SqlValue::Text(String::from_utf8_lossy(&document).into_owned())
    }

    fn null() -> SqlValue {
        SqlValue::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EncoderOptions;
    use crate::query::Query;
    use crate::template::resolve_query;

    #[test]
    fn keys_and_positions_resolve_to_question_marks() {
        let query = Query::new("INSERT INTO t VALUES (:0:), (:1:)")
            .bind(42_i32)
            .bind("six");
        let prepared = resolve_query::<Sqlite>(&query, &EncoderOptions::new(), None).unwrap();
        assert_eq!(prepared.sql, "INSERT INTO t VALUES (?), (?)");
        assert_eq!(
            prepared.params,
            vec![SqlValue::Integer(42), SqlValue::Text("six".into())]
        );
    }

    #[test]
    fn collections_fall_back_to_json_text() {
        let query = Query::new("SELECT ?").bind(vec![1_i64, 2, 3]);
        let prepared = resolve_query::<Sqlite>(&query, &EncoderOptions::new(), None).unwrap();
        assert_eq!(prepared.params, vec![SqlValue::Text("[1,2,3]".into())]);
    }
}
