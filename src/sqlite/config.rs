use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bb8::{ManageConnection, Pool};
use tokio::sync::Mutex;

use crate::error::SqlMiddlewareDbError;
use crate::pool::{ConfigAndPool, MiddlewarePool};
use crate::types::DatabaseType;

/// A pooled `SQLite` connection.
///
/// Work on it runs through [`run_blocking`](super::executor::run_blocking).
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

const MEMORY_PATH: &str = ":memory:";

/// Options for configuring a `SQLite` pool.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub db_path: String,
    pub max_size: u32,
    /// Applied as `PRAGMA journal_mode` on every new connection.
    pub journal_mode: Option<String>,
    pub busy_timeout: Option<Duration>,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            max_size: 4,
            journal_mode: Some("WAL".to_string()),
            busy_timeout: Some(Duration::from_secs(5)),
        }
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.db_path == MEMORY_PATH
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn max_size(mut self, max_size: u32) -> Self {
        self.opts.max_size = max_size.max(1);
        self
    }

    #[must_use]
    pub fn journal_mode(mut self, mode: Option<&str>) -> Self {
        self.opts.journal_mode = mode.map(str::to_string);
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build a `ConfigAndPool` for `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqlMiddlewareDbError` if pool creation or the initial smoke test fails.
    pub async fn build(self) -> Result<ConfigAndPool, SqlMiddlewareDbError> {
        ConfigAndPool::new_sqlite(self.finish()).await
    }
}

/// bb8 manager for `SQLite` connections.
///
/// An in-memory database lives only as long as its connection, so for
/// `:memory:` every checkout hands out the same shared connection.
#[derive(Debug)]
pub struct SqliteManager {
    opts: SqliteOptions,
    shared: Option<SharedSqliteConnection>,
}

impl SqliteManager {
    /// # Errors
    /// Returns `rusqlite::Error` if the shared in-memory connection cannot be opened.
    pub fn new(opts: SqliteOptions) -> Result<Self, rusqlite::Error> {
        let shared = if opts.is_memory() {
            Some(Arc::new(Mutex::new(open_connection(&opts)?)))
        } else {
            None
        };
        Ok(Self { opts, shared })
    }
}

fn open_connection(opts: &SqliteOptions) -> Result<rusqlite::Connection, rusqlite::Error> {
    let conn = rusqlite::Connection::open(&opts.db_path)?;
    if let Some(timeout) = opts.busy_timeout {
        conn.busy_timeout(timeout)?;
    }
    if let Some(mode) = &opts.journal_mode {
        // journal_mode reports the resulting mode as a row.
        let _mode: String = conn.query_row(&format!("PRAGMA journal_mode = {mode}"), [], |row| {
            row.get(0)
        })?;
    }
    Ok(conn)
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let shared = self.shared.clone();
        let opts = self.opts.clone();
        async move {
            if let Some(conn) = shared {
                return Ok(conn);
            }
            tracing::debug!(path = %opts.db_path, "opening sqlite connection");
            Ok(Arc::new(Mutex::new(open_connection(&opts)?)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let conn = Arc::clone(conn);
        async move {
            let guard = conn.lock().await;
            guard
                .query_row("SELECT 1", [], |_| Ok(()))
                .inspect_err(|e| {
                    tracing::warn!(error = %e, "pooled sqlite connection failed validation");
                })
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

impl ConfigAndPool {
    #[must_use]
    pub fn sqlite_builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    /// Asynchronous initializer for `ConfigAndPool` with Sqlite using bb8.
    ///
    /// `:memory:` databases get a pool of one shared connection.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ConnectionError` if pool creation or the
    /// connection test fails.
    pub async fn new_sqlite(opts: SqliteOptions) -> Result<Self, SqlMiddlewareDbError> {
        let memory = opts.is_memory();
        let max_size = if memory { 1 } else { opts.max_size.max(1) };
        let manager = SqliteManager::new(opts)?;

        let mut builder = Pool::builder().max_size(max_size);
        if memory {
            builder = builder.idle_timeout(None).max_lifetime(None);
        }
        let pool = builder.build(manager).await.map_err(|e| {
            SqlMiddlewareDbError::ConnectionError(format!("Failed to create SQLite pool: {e}"))
        })?;

        // Smoke test: surfaces a bad path here rather than on first use.
        {
            let conn = pool.get().await?;
            let handle = Arc::clone(&*conn);
            super::executor::run_blocking(handle, |c| {
                c.query_row("SELECT 1", [], |_| Ok(()))
                    .map_err(SqlMiddlewareDbError::SqliteError)
            })
            .await?;
        }

        Ok(ConfigAndPool {
            pool: MiddlewarePool::Sqlite(pool),
            db_type: DatabaseType::Sqlite,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let opts = ConfigAndPool::sqlite_builder("app.db")
            .max_size(0)
            .journal_mode(None)
            .busy_timeout(Some(Duration::from_millis(250)))
            .finish();
        assert_eq!(opts.db_path, "app.db");
        assert_eq!(opts.max_size, 1);
        assert!(opts.journal_mode.is_none());
        assert_eq!(opts.busy_timeout, Some(Duration::from_millis(250)));
        assert!(!opts.is_memory());
        assert!(SqliteOptions::new(":memory:").is_memory());
    }
}
