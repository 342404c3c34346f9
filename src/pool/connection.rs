use std::borrow::Cow;

#[cfg(feature = "postgres")]
use crate::postgres::PgPooledConnection;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqlitePooledConnection;

use crate::error::EngineError;
use crate::results::ResultSet;
use crate::translation::translate_placeholders;
use crate::types::{Backend, RowValues};

/// A connection checked out of an [`EnginePool`](super::EnginePool).
///
/// SQL handed to it uses `?` placeholders and is rewritten for the backend before execution.
/// The connection returns to the pool on drop.
pub enum PooledSession {
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePooledConnection),
    #[cfg(feature = "postgres")]
    Postgres(PgPooledConnection),
}

impl std::fmt::Debug for PooledSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PooledSession").field(&self.backend()).finish()
    }
}

impl PooledSession {
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => Backend::Sqlite,
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => Backend::Postgres,
        }
    }

    fn native_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        match self.backend().placeholder_style() {
            Some(style) => translate_placeholders(sql, style),
            None => Cow::Borrowed(sql),
        }
    }

    /// Run a statement that yields rows.
    ///
    /// # Errors
    /// Returns the backend's store error if the statement fails.
    pub async fn select(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, EngineError> {
        let sql = self.native_sql(sql);
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => crate::sqlite::select(conn, &sql, params).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => crate::postgres::select(conn, &sql, params).await,
        }
    }

    /// Run a statement and return the number of rows it affected.
    ///
    /// # Errors
    /// Returns the backend's store error if the statement fails.
    pub async fn dml(&self, sql: &str, params: &[RowValues]) -> Result<u64, EngineError> {
        let sql = self.native_sql(sql);
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => crate::sqlite::dml(conn, &sql, params).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => crate::postgres::dml(conn, &sql, params).await,
        }
    }

    /// Open a transaction. SQLite takes the write lock up front (`BEGIN IMMEDIATE`); other
    /// writers wait on the busy timeout.
    ///
    /// # Errors
    /// Returns the backend's store error if the transaction cannot start.
    pub async fn begin(&self) -> Result<(), EngineError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => crate::sqlite::execute_batch(conn, "BEGIN IMMEDIATE").await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => {
                crate::postgres::execute_batch(conn, "BEGIN").await?;
                conn.set_needs_rollback(true);
                Ok(())
            }
        }
    }

    /// # Errors
    /// Returns the backend's store error if the commit fails; the transaction is then still
    /// open and must be rolled back.
    pub async fn commit(&self) -> Result<(), EngineError> {
        self.end_transaction("COMMIT").await
    }

    /// # Errors
    /// Returns the backend's store error if the rollback fails. The connection is then
    /// discarded when it goes back to the pool.
    pub async fn rollback(&self) -> Result<(), EngineError> {
        self.end_transaction("ROLLBACK").await
    }

    async fn end_transaction(&self, sql: &str) -> Result<(), EngineError> {
        self.execute_batch(sql).await?;
        #[cfg(feature = "postgres")]
        if let Self::Postgres(conn) = self {
            conn.set_needs_rollback(false);
        }
        Ok(())
    }

    /// Whether a transaction is still open on this connection.
    #[must_use]
    pub fn needs_rollback(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.try_lock().map(|c| !c.is_autocommit()).unwrap_or(true),
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.needs_rollback(),
        }
    }

    /// Run parameterless SQL, possibly several `;`-separated statements.
    ///
    /// # Errors
    /// Returns the backend's store error if any statement fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), EngineError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => crate::sqlite::execute_batch(conn, sql).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => crate::postgres::execute_batch(conn, sql).await,
        }
    }
}
