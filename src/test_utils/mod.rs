//! Throwaway `PostgreSQL` servers for integration tests.

use postgresql_embedded::PostgreSQL;

use crate::error::SqlMiddlewareDbError;
use crate::pool::ConfigAndPool;
use crate::postgres::PostgresOptions;

/// A running embedded `PostgreSQL` instance and a pool connected to it.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    pub database_url: String,
    pub config_and_pool: ConfigAndPool,
}

/// Start an embedded server, create `db_name` on it, and connect a pool.
///
/// # Errors
/// Returns an error if the server cannot be set up or started, the database
/// cannot be created, or the first connection fails.
pub async fn setup_postgres_embedded(
    db_name: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error + Send + Sync>> {
    let mut postgresql = PostgreSQL::default();
    postgresql.setup().await?;
    postgresql.start().await?;

    let settings = postgresql.settings();
    let port = settings.port;
    let host = settings.host.clone();
    let user = settings.username.clone();
    let password = settings.password.clone();

    postgresql.create_database(db_name).await?;

    let database_url = format!("postgres://{user}:{password}@{host}:{port}/{db_name}");
    tracing::debug!(port, db_name, "embedded postgres started");

    let mut cfg = tokio_postgres::Config::new();
    cfg.host(&host)
        .port(port)
        .user(&user)
        .password(&password)
        .dbname(db_name);
    let config_and_pool = ConfigAndPool::new_postgres(PostgresOptions::new(cfg)).await?;
    config_and_pool
        .get_connection()
        .await?
        .execute_batch("SELECT 1")
        .await?;

    Ok(EmbeddedPostgres {
        postgresql,
        port,
        database_url,
        config_and_pool,
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
///
/// # Errors
/// Returns `SqlMiddlewareDbError::Other` if the server does not stop cleanly.
pub async fn stop_postgres_embedded(
    postgres: EmbeddedPostgres,
) -> Result<(), SqlMiddlewareDbError> {
    let EmbeddedPostgres {
        postgresql,
        config_and_pool,
        ..
    } = postgres;
    config_and_pool.shutdown().await;
    postgresql
        .stop()
        .await
        .map_err(|e| SqlMiddlewareDbError::Other(format!("failed to stop embedded postgres: {e}")))
}
