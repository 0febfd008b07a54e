use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;

use super::config::SharedSqliteConnection;
use super::query::build_result_set;
use crate::error::SqlMiddlewareDbError;
use crate::results::ResultSet;
use crate::template::Prepared;

/// Run `func` against the connection on the blocking thread pool.
///
/// # Errors
/// Returns the closure's error, or `ExecutionError` if the blocking task panicked.
pub async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlMiddlewareDbError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlMiddlewareDbError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlMiddlewareDbError::ExecutionError(format!("sqlite blocking task failed: {e}")))?
}

/// Execute resolved statements in order on one connection.
///
/// Stops at the first failure; statements already run stay applied.
///
/// # Errors
/// Returns the first statement error.
pub async fn execute_prepared(
    conn: SharedSqliteConnection,
    statements: Vec<Prepared<SqlValue>>,
) -> Result<usize, SqlMiddlewareDbError> {
    run_blocking(conn, move |conn| {
        let mut affected = 0;
        for prepared in &statements {
            affected += execute_one(conn, prepared)?;
        }
        Ok(affected)
    })
    .await
}

fn execute_one(
    conn: &rusqlite::Connection,
    prepared: &Prepared<SqlValue>,
) -> Result<usize, SqlMiddlewareDbError> {
    if prepared.params.is_empty() {
        // Unparameterized text may hold several statements.
        conn.execute_batch(&prepared.sql)?;
        return Ok(conn.changes().try_into().unwrap_or(usize::MAX));
    }
    let mut stmt = conn.prepare_cached(&prepared.sql)?;
    Ok(stmt.execute(params_from_iter(prepared.params.iter()))?)
}

/// Run a resolved SELECT and collect its rows.
///
/// # Errors
/// Returns errors from preparation, execution, or value extraction.
pub async fn fetch_prepared(
    conn: SharedSqliteConnection,
    prepared: Prepared<SqlValue>,
) -> Result<ResultSet, SqlMiddlewareDbError> {
    run_blocking(conn, move |conn| {
        let mut stmt = conn.prepare_cached(&prepared.sql)?;
        build_result_set(&mut stmt, &prepared.params)
    })
    .await
}
