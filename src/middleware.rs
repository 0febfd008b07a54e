// Flat re-export hub so callers can `use sql_template_middleware::middleware::*`
// without learning the module layout.

pub use crate::backend::Backend;
pub use crate::codec::{
    ColumnKey, DecoderOptions, EncoderOptions, KeyDecodingStrategy, KeyEncodingStrategy,
    NativeConversion, NilEncodingStrategy, decode_row, encode, encode_binding, encode_value,
    to_value,
};
pub use crate::database::{Database, MiddlewareDatabase};
pub use crate::error::{BindingError, DecodeError, EncodeError, SqlMiddlewareDbError};
pub use crate::executor::PreparedBatch;
pub use crate::pool::{ConfigAndPool, MiddlewarePool, MiddlewarePoolConnection};
pub use crate::query::Query;
pub use crate::results::{ColumnValue, ResultSet, Row};
pub use crate::template::{Prepared, Template, TemplateCache, resolve_query};
pub use crate::types::{DatabaseType, Integer, Value};

#[cfg(feature = "postgres")]
pub use crate::postgres::{PgManager, PgValue, Postgres, PostgresOptions};
#[cfg(feature = "sqlite")]
pub use crate::sqlite::{Sqlite, SqliteManager, SqliteOptions, SqliteOptionsBuilder};
