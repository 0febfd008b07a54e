use std::future::Future;

use bb8::{ManageConnection, Pool};
use tokio_postgres::{Client, NoTls};

use crate::error::SqlMiddlewareDbError;
use crate::pool::{ConfigAndPool, MiddlewarePool};
use crate::types::DatabaseType;

/// Options for configuring a Postgres pool.
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    pub config: tokio_postgres::Config,
    pub max_size: u32,
}

impl PostgresOptions {
    #[must_use]
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self {
            config,
            max_size: 10,
        }
    }

    #[must_use]
    pub fn max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }
}

/// bb8 manager for Postgres clients.
#[derive(Debug, Clone)]
pub struct PgManager {
    pub(crate) config: tokio_postgres::Config,
}

impl PgManager {
    #[must_use]
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self { config }
    }
}

impl ManageConnection for PgManager {
    type Connection = Client;
    type Error = tokio_postgres::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let cfg = self.config.clone();
        async move {
            tracing::debug!(
                hosts = ?cfg.get_hosts(),
                dbname = ?cfg.get_dbname(),
                "opening postgres connection"
            );
            let (client, connection) = cfg.connect(NoTls).await?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::debug!(error = %e, "postgres connection task ended");
                }
            });
            Ok(client)
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move {
            conn.simple_query("SELECT 1").await.map(|_| ()).inspect_err(|e| {
                tracing::warn!(error = %e, "pooled postgres connection failed validation");
            })
        }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed()
    }
}

impl ConfigAndPool {
    /// Asynchronous initializer for `ConfigAndPool` with Postgres.
    ///
    /// # Errors
    /// Returns `SqlMiddlewareDbError::ConfigError` if dbname, host or user is
    /// missing, or `SqlMiddlewareDbError::ConnectionError` if pool creation fails.
    pub async fn new_postgres(opts: PostgresOptions) -> Result<Self, SqlMiddlewareDbError> {
        let cfg = &opts.config;
        if cfg.get_dbname().is_none() {
            return Err(SqlMiddlewareDbError::ConfigError(
                "dbname is required".to_string(),
            ));
        }
        if cfg.get_hosts().is_empty() {
            return Err(SqlMiddlewareDbError::ConfigError(
                "host is required".to_string(),
            ));
        }
        if cfg.get_user().is_none() {
            return Err(SqlMiddlewareDbError::ConfigError(
                "user is required".to_string(),
            ));
        }

        let pool = Pool::builder()
            .max_size(opts.max_size)
            .build(PgManager::new(opts.config))
            .await
            .map_err(|e| {
                SqlMiddlewareDbError::ConnectionError(format!(
                    "Failed to create Postgres pool: {e}"
                ))
            })?;

        Ok(ConfigAndPool {
            pool: MiddlewarePool::Postgres(pool),
            db_type: DatabaseType::Postgres,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_dbname_is_a_config_error() {
        let mut cfg = tokio_postgres::Config::new();
        cfg.host("localhost").user("postgres");
        let err = ConfigAndPool::new_postgres(PostgresOptions::new(cfg))
            .await
            .unwrap_err();
        assert!(matches!(err, SqlMiddlewareDbError::ConfigError(ref m) if m.contains("dbname")));
    }

    #[tokio::test]
    async fn missing_host_is_a_config_error() {
        let mut cfg = tokio_postgres::Config::new();
        cfg.dbname("app").user("postgres");
        let err = ConfigAndPool::new_postgres(PostgresOptions::new(cfg))
            .await
            .unwrap_err();
        assert!(matches!(err, SqlMiddlewareDbError::ConfigError(ref m) if m.contains("host")));
    }
}
