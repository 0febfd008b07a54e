pub mod connection;
pub mod types;

pub use connection::MiddlewarePoolConnection;
pub use types::MiddlewarePool;

use std::future::Future;

use crate::error::SqlMiddlewareDbError;
use crate::types::DatabaseType;

/// Configuration and connection pool for a database
///
/// This struct holds both the configuration and the connection pool
/// for a database, making it easier to manage database connections.
/// Build one with [`ConfigAndPool::new_postgres`] or
/// [`ConfigAndPool::sqlite_builder`].
#[derive(Clone, Debug)]
pub struct ConfigAndPool {
    /// The connection pool
    pub pool: MiddlewarePool,
    /// The database type
    pub db_type: DatabaseType,
}

impl ConfigAndPool {
    /// Check out a connection. It goes back to the pool when dropped.
    ///
    /// # Errors
    /// Returns the pool error if no connection can be provided.
    pub async fn get_connection(&self) -> Result<MiddlewarePoolConnection, SqlMiddlewareDbError> {
        self.pool.get_connection().await
    }

    /// Run `f` with a leased connection.
    ///
    /// The connection is owned by the future `f` returns, so it is handed
    /// back to the pool whether that future completes, fails, or is dropped.
    ///
    /// # Errors
    /// Returns the pool error if no connection can be provided, otherwise
    /// whatever `f` returns.
    pub async fn lease<F, Fut, T>(&self, f: F) -> Result<T, SqlMiddlewareDbError>
    where
        F: FnOnce(MiddlewarePoolConnection) -> Fut,
        Fut: Future<Output = Result<T, SqlMiddlewareDbError>>,
    {
        let conn = self.get_connection().await?;
        f(conn).await
    }

    /// Release the pool. Idle connections close as the last handle drops;
    /// connections still leased close when their lease ends.
    pub async fn shutdown(self) {
        tracing::debug!(
            backend = ?self.db_type,
            connections = self.pool.connections(),
            "shutting down pool"
        );
        drop(self.pool);
        tokio::task::yield_now().await;
    }
}
