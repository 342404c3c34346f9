//! The CRUD engine: a pooled connection to one database plus the operations callers run on it.

mod read;
mod tx;
mod write;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::logger::QueryLogger;
use crate::pool::{EnginePool, PooledSession};
use crate::record::Record;
use crate::results::ResultSet;
use crate::sql::Statement;
use crate::types::Backend;

/// A live connection pool with CRUD operations over [`Record`] types.
///
/// `Engine` is `Send + Sync`; share one instance across tasks with `Arc<Engine>`.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use crud_engine::prelude::*;
///
/// # async fn run() -> Result<(), EngineError> {
/// let engine = EngineConfig::sqlite_builder("app.db")
///     .max_open_connections(4)
///     .open(Arc::new(TracingLogger::default()))
///     .await?;
/// engine
///     .execute_batch("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, en_name TEXT)")
///     .await?;
/// engine.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    pool: RwLock<Option<EnginePool>>,
    backend: Backend,
    logger: Arc<dyn QueryLogger>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.backend)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Validate `config`, create the database if it is missing and the init mode allows it,
    /// and open the connection pool.
    ///
    /// # Errors
    /// Returns `EngineError::Config` for invalid settings and `EngineError::Connection` if the
    /// database cannot be created or reached.
    pub async fn open(
        config: EngineConfig,
        logger: Arc<dyn QueryLogger>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let pool = EnginePool::connect(&config).await.inspect_err(|e| {
            logger.error(&format!(
                "failed to open {:?} database {:?}: {e}",
                config.backend, config.database_name
            ));
        })?;
        logger.info(&format!(
            "opened {:?} database {:?}",
            config.backend, config.database_name
        ));
        Ok(Self {
            pool: RwLock::new(Some(pool)),
            backend: config.backend,
            logger,
        })
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Release the pool. Connections still checked out close when their operation finishes.
    ///
    /// # Errors
    /// Returns `EngineError::Connection` if the engine is already closed.
    pub fn close(&self) -> Result<(), EngineError> {
        let pool = self
            .pool
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pool {
            Some(pool) => {
                drop(pool);
                self.logger.info(&format!("closed {:?} engine", self.backend));
                Ok(())
            }
            None => Err(closed()),
        }
    }

    /// Run parameterless SQL such as DDL directly on a pooled connection.
    ///
    /// # Errors
    /// Returns `EngineError::Connection` for a closed engine or the store error of the first
    /// failing statement.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), EngineError> {
        let session = self.session().await?;
        let begin = Instant::now();
        let result = session.execute_batch(sql).await;
        self.logger
            .trace(begin, &|| (sql.to_string(), 0_u64), result.as_ref().err());
        result
    }

    fn pool(&self) -> Result<EnginePool, EngineError> {
        self.pool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(closed)
    }

    async fn session(&self) -> Result<PooledSession, EngineError> {
        self.pool()?.get_connection().await
    }
}

fn closed() -> EngineError {
    EngineError::Connection("engine is closed".to_string())
}

fn row_count(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

/// Run a row-yielding statement and report it to the logger.
async fn traced_select(
    logger: &dyn QueryLogger,
    session: &PooledSession,
    stmt: &Statement,
) -> Result<ResultSet, EngineError> {
    let begin = Instant::now();
    let result = session.select(&stmt.sql, &stmt.params).await;
    let rows = result.as_ref().map_or(0, |rs| row_count(rs.len()));
    logger.trace(begin, &|| (stmt.sql.clone(), rows), result.as_ref().err());
    result
}

/// Run a row-count statement and report it to the logger.
async fn traced_dml(
    logger: &dyn QueryLogger,
    session: &PooledSession,
    stmt: &Statement,
) -> Result<u64, EngineError> {
    let begin = Instant::now();
    let result = session.dml(&stmt.sql, &stmt.params).await;
    let rows = result.as_ref().map_or(0, |n| *n);
    logger.trace(begin, &|| (stmt.sql.clone(), rows), result.as_ref().err());
    result
}

fn decode_rows<R: Record>(rows: &ResultSet) -> Result<Vec<R>, EngineError> {
    rows.results.iter().map(R::from_row).collect()
}
