use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bb8::{ManageConnection, Pool, PooledConnection};
use rusqlite::{Connection, OpenFlags};
use tokio::sync::Mutex;

use crate::config::{EngineConfig, InitMode};
use crate::error::EngineError;

/// Shared handle to a single `SQLite` connection; the mutex serializes blocking work on it.
pub type SharedSqliteConnection = Arc<Mutex<Connection>>;
pub type SqlitePooledConnection = PooledConnection<'static, SqliteManager>;

/// How long a connection waits on a locked database before giving up with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// bb8 manager for `SQLite` connections to one database file.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    path: PathBuf,
    flags: OpenFlags,
}

impl SqliteManager {
    /// Pooled connections never create the file; [`bootstrap`] does that once, up front.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flags: OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        }
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        let conn = Connection::open_with_flags(&self.path, self.flags)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let opened = self.open();
        async move { opened.map(|conn| Arc::new(Mutex::new(conn))) }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let handle = Arc::clone(conn);
        async move {
            let guard = handle.lock().await;
            guard.query_row("SELECT 1", [], |_| Ok(()))
        }
    }

    /// A connection handed back mid-transaction (its task was cancelled) is not reused.
    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.try_lock().map(|c| !c.is_autocommit()).unwrap_or(true)
    }
}

/// `PRAGMA encoding` value for a configured character set.
fn sqlite_encoding(charset: &str) -> Result<&'static str, EngineError> {
    match charset.to_ascii_lowercase().as_str() {
        "utf8" | "utf8mb4" | "utf-8" => Ok("UTF-8"),
        "utf16" | "utf-16" | "utf16le" | "utf-16le" => Ok("UTF-16le"),
        "utf16be" | "utf-16be" => Ok("UTF-16be"),
        other => Err(EngineError::Config(format!(
            "character set {other:?} is not supported by SQLite"
        ))),
    }
}

/// Create the database file with the configured encoding when it does not exist yet.
///
/// # Errors
/// Returns `EngineError::Config` for an unsupported character set and
/// `EngineError::Connection` if the file is missing under [`InitMode::AssumeExists`] or
/// cannot be created.
pub fn bootstrap(config: &EngineConfig) -> Result<(), EngineError> {
    let path = Path::new(&config.database_name);
    if path.exists() {
        return Ok(());
    }
    if config.init_mode == InitMode::AssumeExists {
        return Err(EngineError::Connection(format!(
            "SQLite database {path:?} does not exist"
        )));
    }
    let encoding = sqlite_encoding(&config.charset)?;
    let conn = Connection::open(path).map_err(|e| {
        EngineError::Connection(format!("failed to create SQLite database {path:?}: {e}"))
    })?;
    conn.pragma_update(None, "encoding", encoding)
        .and_then(|()| {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })
        })
        .map_err(|e| {
            EngineError::Connection(format!("failed to initialize SQLite database: {e}"))
        })?;
    Ok(())
}

/// Bootstrap if needed, prove the file opens, then build the pool.
///
/// # Errors
/// Returns `EngineError::Connection` if the database cannot be opened.
pub async fn build_pool(config: &EngineConfig) -> Result<Pool<SqliteManager>, EngineError> {
    bootstrap(config)?;

    let manager = SqliteManager::new(&config.database_name);
    manager
        .open()
        .and_then(|conn| conn.query_row("SELECT 1", [], |_| Ok(())))
        .map_err(|e| EngineError::Connection(format!("SQLite smoke test failed: {e}")))?;

    Pool::builder()
        .max_size(config.max_size())
        .min_idle(config.min_idle())
        .max_lifetime(config.max_lifetime())
        .build(manager)
        .await
        .map_err(|e| EngineError::Connection(format!("Failed to create SQLite pool: {e}")))
}
