//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::middleware::{
    ColumnValue, ConfigAndPool, Database, DatabaseType, DecoderOptions, EncoderOptions,
    KeyDecodingStrategy, KeyEncodingStrategy, MiddlewareDatabase, MiddlewarePool,
    MiddlewarePoolConnection, NilEncodingStrategy, Query, ResultSet, Row, SqlMiddlewareDbError,
    TemplateCache, Value,
};

pub use crate::query;

#[cfg(feature = "postgres")]
pub use crate::middleware::{Postgres, PostgresOptions};

#[cfg(feature = "sqlite")]
pub use crate::middleware::{Sqlite, SqliteOptions, SqliteOptionsBuilder};
