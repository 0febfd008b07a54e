use std::fmt::Display;

use thiserror::Error;

/// Failures while resolving a template against its bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A `:key` was opened but never closed before the end of the template.
    #[error("unterminated placeholder `:{key}` starting at byte {offset}")]
    UnterminatedPlaceholder { key: String, offset: usize },
}

/// Failures while turning an application value into column values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
}

/// Failures while turning a returned row into an application value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing column `{0}`")]
    MissingKey(String),

    #[error("column `{column}`: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("column `{column}` has unsupported type {found}")]
    UnsupportedColumnType { column: String, found: String },

    #[error("{0}")]
    Message(String),
}

impl serde::ser::Error for EncodeError {
    fn custom<T: Display>(msg: T) -> Self {
        EncodeError::UnsupportedValue(msg.to_string())
    }
}

impl serde::de::Error for DecodeError {
    fn custom<T: Display>(msg: T) -> Self {
        DecodeError::Message(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        DecodeError::MissingKey(field.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SqlMiddlewareDbError {
    #[error(transparent)]
    BindingError(#[from] BindingError),

    #[error(transparent)]
    EncodeError(#[from] EncodeError),

    #[error(transparent)]
    DecodeError(#[from] DecodeError),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolErrorPostgres(#[from] bb8::RunError<tokio_postgres::Error>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Other database error: {0}")]
    Other(String),
}

#[cfg(feature = "sqlite")]
impl From<bb8::RunError<rusqlite::Error>> for SqlMiddlewareDbError {
    fn from(err: bb8::RunError<rusqlite::Error>) -> Self {
        SqlMiddlewareDbError::ConnectionError(format!("SQLite pool error: {err}"))
    }
}
