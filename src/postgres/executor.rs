use crate::error::EngineError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::config::PgPooledConnection;
use super::params::Params;
use super::query::build_result_set_from_statement;

/// Execute a statement that yields rows.
///
/// # Errors
/// Returns `EngineError::PostgresError` if preparation or execution fails.
pub async fn select(
    conn: &PgPooledConnection,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, EngineError> {
    let stmt = conn.prepare(query).await?;
    let converted = Params::convert(params);
    let rows = conn.query(&stmt, converted.as_refs()).await?;
    build_result_set_from_statement(&stmt, &rows)
}

/// Execute a DML statement and return rows affected.
///
/// # Errors
/// Returns `EngineError::PostgresError` if preparation or execution fails.
pub async fn dml(
    conn: &PgPooledConnection,
    query: &str,
    params: &[RowValues],
) -> Result<u64, EngineError> {
    let stmt = conn.prepare(query).await?;
    let converted = Params::convert(params);
    Ok(conn.execute(&stmt, converted.as_refs()).await?)
}

/// Execute one or more parameterless statements, e.g. DDL or `BEGIN`/`COMMIT`.
///
/// # Errors
/// Returns `EngineError::PostgresError` if any statement fails.
pub async fn execute_batch(conn: &PgPooledConnection, sql: &str) -> Result<(), EngineError> {
    Ok(conn.batch_execute(sql).await?)
}
