use tokio_postgres::Client;

use super::params::PgValue;
use super::query::build_result_set;
use crate::error::SqlMiddlewareDbError;
use crate::results::ResultSet;
use crate::template::Prepared;

/// Execute one resolved statement, returning the number of rows affected.
///
/// # Errors
/// Returns errors from statement preparation or execution.
pub async fn execute_prepared(
    client: &Client,
    prepared: &Prepared<PgValue>,
) -> Result<u64, SqlMiddlewareDbError> {
    if prepared.params.is_empty() {
        // Unparameterized text may hold several statements.
        client.batch_execute(&prepared.sql).await?;
        return Ok(0);
    }
    let stmt = client.prepare(&prepared.sql).await?;
    Ok(client.execute_raw(&stmt, prepared.params.iter()).await?)
}

/// Run a resolved SELECT and collect its rows.
///
/// # Errors
/// Returns errors from preparation, execution, or value extraction.
pub async fn fetch_prepared(
    client: &Client,
    prepared: &Prepared<PgValue>,
) -> Result<ResultSet, SqlMiddlewareDbError> {
    let stmt = client.prepare(&prepared.sql).await?;
    build_result_set(client, &stmt, &prepared.params).await
}
