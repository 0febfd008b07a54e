use crate::codec::EncoderOptions;
use crate::error::SqlMiddlewareDbError;
use crate::pool::MiddlewarePoolConnection;
use crate::query::Query;
use crate::results::ResultSet;
use crate::template::{Prepared, TemplateCache, resolve_query};
use crate::types::DatabaseType;

#[cfg(feature = "postgres")]
use crate::postgres::{self, PgValue, Postgres};
#[cfg(feature = "sqlite")]
use crate::sqlite::{self, Sqlite};

/// Queries resolved for one backend, ready to send.
#[derive(Debug, Clone)]
pub enum PreparedBatch {
    #[cfg(feature = "postgres")]
    Postgres(Vec<Prepared<PgValue>>),
    #[cfg(feature = "sqlite")]
    Sqlite(Vec<Prepared<rusqlite::types::Value>>),
}

impl PreparedBatch {
    /// Resolve every query for `db_type`. Nothing is returned unless all of
    /// them resolve.
    ///
    /// # Errors
    /// Returns the first `BindingError` or `EncodeError`.
    pub fn resolve(
        db_type: DatabaseType,
        queries: &[Query],
        options: &EncoderOptions,
        cache: Option<&TemplateCache>,
    ) -> Result<Self, SqlMiddlewareDbError> {
        match db_type {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => queries
                .iter()
                .map(|q| resolve_query::<Postgres>(q, options, cache))
                .collect::<Result<_, _>>()
                .map(PreparedBatch::Postgres),
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => queries
                .iter()
                .map(|q| resolve_query::<Sqlite>(q, options, cache))
                .collect::<Result<_, _>>()
                .map(PreparedBatch::Sqlite),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            #[cfg(feature = "postgres")]
            PreparedBatch::Postgres(statements) => statements.len(),
            #[cfg(feature = "sqlite")]
            PreparedBatch::Sqlite(statements) => statements.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn mismatch(conn: &MiddlewarePoolConnection) -> SqlMiddlewareDbError {
    SqlMiddlewareDbError::Other(format!(
        "prepared statements do not match a {:?} connection",
        conn.database_type()
    ))
}

impl MiddlewarePoolConnection {
    /// Run resolved statements one at a time, in order.
    ///
    /// The first failure stops the batch; earlier statements stay applied.
    ///
    /// # Errors
    /// Returns the first statement error.
    pub async fn run_prepared(&self, batch: PreparedBatch) -> Result<usize, SqlMiddlewareDbError> {
        match (self, batch) {
            #[cfg(feature = "postgres")]
            (
                MiddlewarePoolConnection::Postgres { client },
                PreparedBatch::Postgres(statements),
            ) => {
                let mut affected = 0;
                for prepared in &statements {
                    let rows = postgres::execute_prepared(client, prepared).await?;
                    affected += usize::try_from(rows).unwrap_or(usize::MAX);
                }
                Ok(affected)
            }
            #[cfg(feature = "sqlite")]
            (MiddlewarePoolConnection::Sqlite { .. }, PreparedBatch::Sqlite(statements)) => {
                sqlite::execute_prepared(self.sqlite_conn()?, statements).await
            }
            #[allow(unreachable_patterns)]
            _ => Err(mismatch(self)),
        }
    }

    /// Run the last statement of a resolved batch as a query.
    ///
    /// # Errors
    /// Returns an error if the batch is empty or the query fails.
    pub async fn fetch_prepared(
        &self,
        batch: PreparedBatch,
    ) -> Result<ResultSet, SqlMiddlewareDbError> {
        let empty = || SqlMiddlewareDbError::ExecutionError("no statement to run".to_string());
        match (self, batch) {
            #[cfg(feature = "postgres")]
            (
                MiddlewarePoolConnection::Postgres { client },
                PreparedBatch::Postgres(statements),
            ) => {
                let prepared = statements.last().ok_or_else(empty)?;
                postgres::fetch_prepared(client, prepared).await
            }
            #[cfg(feature = "sqlite")]
            (MiddlewarePoolConnection::Sqlite { .. }, PreparedBatch::Sqlite(mut statements)) => {
                let prepared = statements.pop().ok_or_else(empty)?;
                sqlite::fetch_prepared(self.sqlite_conn()?, prepared).await
            }
            #[allow(unreachable_patterns)]
            _ => Err(mismatch(self)),
        }
    }

    /// Resolve and execute one query on this connection.
    ///
    /// # Errors
    /// Returns resolution errors before anything is sent, then statement errors.
    pub async fn execute(
        &self,
        query: &Query,
        options: &EncoderOptions,
    ) -> Result<usize, SqlMiddlewareDbError> {
        let batch = PreparedBatch::resolve(
            self.database_type(),
            std::slice::from_ref(query),
            options,
            None,
        )?;
        self.run_prepared(batch).await
    }

    /// Resolve and run one query on this connection, collecting its rows.
    ///
    /// # Errors
    /// Returns resolution errors before anything is sent, then query errors.
    pub async fn fetch(
        &self,
        query: &Query,
        options: &EncoderOptions,
    ) -> Result<ResultSet, SqlMiddlewareDbError> {
        let batch = PreparedBatch::resolve(
            self.database_type(),
            std::slice::from_ref(query),
            options,
            None,
        )?;
        self.fetch_prepared(batch).await
    }

    /// Execute raw SQL text, which may contain several statements. No
    /// template resolution is applied.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlMiddlewareDbError> {
        match self {
            #[cfg(feature = "postgres")]
            MiddlewarePoolConnection::Postgres { client } => Ok(client.batch_execute(sql).await?),
            #[cfg(feature = "sqlite")]
            MiddlewarePoolConnection::Sqlite { .. } => {
                let sql = sql.to_string();
                sqlite::run_blocking(self.sqlite_conn()?, move |conn| {
                    conn.execute_batch(&sql)
                        .map_err(SqlMiddlewareDbError::SqliteError)
                })
                .await
            }
        }
    }
}
