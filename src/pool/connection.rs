#[cfg(any(feature = "postgres", feature = "sqlite"))]
use bb8::PooledConnection;

#[cfg(feature = "postgres")]
use crate::postgres::PgManager;
#[cfg(feature = "sqlite")]
use crate::sqlite::{SharedSqliteConnection, SqliteManager};

use super::types::MiddlewarePool;
use crate::error::SqlMiddlewareDbError;
use crate::types::DatabaseType;

/// A connection leased from a [`MiddlewarePool`]. Dropping it returns the
/// connection to its pool.
pub enum MiddlewarePoolConnection {
    #[cfg(feature = "postgres")]
    Postgres {
        client: PooledConnection<'static, PgManager>,
    },
    #[cfg(feature = "sqlite")]
    Sqlite {
        conn: PooledConnection<'static, SqliteManager>,
    },
}

impl std::fmt::Debug for MiddlewarePoolConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres { .. } => f.debug_tuple("Postgres").field(&"<Client>").finish(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite { .. } => f.debug_tuple("Sqlite").field(&"<Connection>").finish(),
        }
    }
}

impl MiddlewarePool {
    /// Get a connection from the pool
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::PoolErrorPostgres` or
    /// `SqlMiddlewareDbError::ConnectionError` if the pool cannot provide a connection.
    pub async fn get_connection(&self) -> Result<MiddlewarePoolConnection, SqlMiddlewareDbError> {
        match self {
            #[cfg(feature = "postgres")]
            MiddlewarePool::Postgres(pool) => {
                let client = pool.get_owned().await?;
                Ok(MiddlewarePoolConnection::Postgres { client })
            }
            #[cfg(feature = "sqlite")]
            MiddlewarePool::Sqlite(pool) => {
                let conn = pool.get_owned().await?;
                Ok(MiddlewarePoolConnection::Sqlite { conn })
            }
        }
    }
}

impl MiddlewarePoolConnection {
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres { .. } => DatabaseType::Postgres,
            #[cfg(feature = "sqlite")]
            Self::Sqlite { .. } => DatabaseType::Sqlite,
        }
    }

    /// The underlying `tokio_postgres` client.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::Other` on a non-Postgres connection.
    #[cfg(feature = "postgres")]
    pub fn postgres_client(&self) -> Result<&tokio_postgres::Client, SqlMiddlewareDbError> {
        match self {
            Self::Postgres { client } => Ok(&**client),
            #[allow(unreachable_patterns)]
            _ => Err(SqlMiddlewareDbError::Other(
                "connection is not a Postgres connection".to_string(),
            )),
        }
    }

    /// A handle to the underlying `rusqlite` connection.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::Other` on a non-SQLite connection.
    #[cfg(feature = "sqlite")]
    pub fn sqlite_conn(&self) -> Result<SharedSqliteConnection, SqlMiddlewareDbError> {
        match self {
            Self::Sqlite { conn } => Ok(std::sync::Arc::clone(&**conn)),
            #[allow(unreachable_patterns)]
            _ => Err(SqlMiddlewareDbError::Other(
                "connection is not a SQLite connection".to_string(),
            )),
        }
    }
}
