#[cfg(feature = "postgres")]
use crate::postgres::PgManager;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteManager;

use crate::types::DatabaseType;

/// Connection pool for database access
///
/// This enum wraps the bb8 pool of each supported database engine.
#[derive(Clone, Debug)]
pub enum MiddlewarePool {
    /// `PostgreSQL` connection pool
    #[cfg(feature = "postgres")]
    Postgres(bb8::Pool<PgManager>),
    /// `SQLite` connection pool
    #[cfg(feature = "sqlite")]
    Sqlite(bb8::Pool<SqliteManager>),
}

impl MiddlewarePool {
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "postgres")]
            MiddlewarePool::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "sqlite")]
            MiddlewarePool::Sqlite(_) => DatabaseType::Sqlite,
        }
    }

    /// Connections currently open, idle or checked out.
    #[must_use]
    pub fn connections(&self) -> u32 {
        match self {
            #[cfg(feature = "postgres")]
            MiddlewarePool::Postgres(pool) => pool.state().connections,
            #[cfg(feature = "sqlite")]
            MiddlewarePool::Sqlite(pool) => pool.state().connections,
        }
    }

    /// Connections sitting idle in the pool.
    #[must_use]
    pub fn idle_connections(&self) -> u32 {
        match self {
            #[cfg(feature = "postgres")]
            MiddlewarePool::Postgres(pool) => pool.state().idle_connections,
            #[cfg(feature = "sqlite")]
            MiddlewarePool::Sqlite(pool) => pool.state().idle_connections,
        }
    }
}
