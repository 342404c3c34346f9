#[cfg(feature = "postgres")]
use crate::postgres::PgManager;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteManager;

use bb8::Pool;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::types::Backend;

use super::connection::PooledSession;

/// Connection pool for the configured backend.
#[derive(Clone)]
pub enum EnginePool {
    /// `SQLite` connection pool
    #[cfg(feature = "sqlite")]
    Sqlite(Pool<SqliteManager>),
    /// `PostgreSQL` connection pool
    #[cfg(feature = "postgres")]
    Postgres(Pool<PgManager>),
}

// Manual Debug implementation because PgManager doesn't implement Debug
impl std::fmt::Debug for EnginePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => f.debug_tuple("Sqlite").field(&pool.state()).finish(),
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => f.debug_tuple("Postgres").field(&pool.state()).finish(),
        }
    }
}

impl EnginePool {
    /// Bootstrap the database if needed and build a pool for it.
    ///
    /// # Errors
    /// Returns `EngineError::Config` or `EngineError::Connection` from the backend setup.
    #[allow(unreachable_patterns)]
    pub async fn connect(config: &EngineConfig) -> Result<Self, EngineError> {
        match config.backend {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite => crate::sqlite::build_pool(config).await.map(Self::Sqlite),
            #[cfg(feature = "postgres")]
            Backend::Postgres => crate::postgres::build_pool(config).await.map(Self::Postgres),
            other => Err(EngineError::Config(format!(
                "{other:?} support is not compiled in"
            ))),
        }
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => Backend::Sqlite,
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => Backend::Postgres,
        }
    }

    /// Check a connection out of the pool, waiting up to the pool's connection timeout.
    ///
    /// # Errors
    /// Returns `EngineError::Connection` if no connection becomes available.
    pub async fn get_connection(&self) -> Result<PooledSession, EngineError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => Ok(PooledSession::Sqlite(pool.get_owned().await?)),
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => Ok(PooledSession::Postgres(pool.get_owned().await?)),
        }
    }
}
