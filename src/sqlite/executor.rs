use std::sync::Arc;

use crate::error::EngineError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::config::{SharedSqliteConnection, SqlitePooledConnection};
use super::params::Params;
use super::query::build_result_set;

/// Run synchronous `rusqlite` work on the blocking pool while holding the connection lock.
pub(crate) async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, EngineError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, EngineError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| EngineError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

fn handle(conn: &SqlitePooledConnection) -> SharedSqliteConnection {
    Arc::clone(&**conn)
}

/// Execute a statement that yields rows.
///
/// # Errors
/// Returns `EngineError::SqliteError` if preparation or execution fails.
pub async fn select(
    conn: &SqlitePooledConnection,
    query: &str,
    params: &[RowValues],
) -> Result<ResultSet, EngineError> {
    let sql_owned = query.to_owned();
    let params_owned = Params::convert(params);
    run_blocking(handle(conn), move |guard| {
        let mut stmt = guard.prepare(&sql_owned)?;
        build_result_set(&mut stmt, &params_owned)
    })
    .await
}

/// Execute a DML statement and return rows affected.
///
/// # Errors
/// Returns `EngineError::SqliteError` if preparation or execution fails.
pub async fn dml(
    conn: &SqlitePooledConnection,
    query: &str,
    params: &[RowValues],
) -> Result<u64, EngineError> {
    let sql_owned = query.to_owned();
    let params_owned = Params::convert(params);
    run_blocking(handle(conn), move |guard| {
        let mut stmt = guard.prepare(&sql_owned)?;
        let affected = stmt.execute(&params_owned.as_refs()[..])?;
        u64::try_from(affected).map_err(|e| {
            EngineError::ExecutionError(format!("sqlite affected rows conversion error: {e}"))
        })
    })
    .await
}

/// Execute one or more parameterless statements, e.g. DDL or `BEGIN`/`COMMIT`.
///
/// # Errors
/// Returns `EngineError::SqliteError` if any statement fails.
pub async fn execute_batch(conn: &SqlitePooledConnection, sql: &str) -> Result<(), EngineError> {
    let sql_owned = sql.to_owned();
    run_blocking(handle(conn), move |guard| {
        guard.execute_batch(&sql_owned)?;
        Ok(())
    })
    .await
}
