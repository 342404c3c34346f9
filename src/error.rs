use thiserror::Error;

/// Errors surfaced by every engine operation.
///
/// Store errors from the drivers are carried verbatim (`#[error(transparent)]`) so callers can
/// still match on the driver's own error codes, e.g. a unique-constraint violation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl EngineError {
    /// True for failures reported by the underlying database engine.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            Self::PostgresError(_) => true,
            #[cfg(feature = "sqlite")]
            Self::SqliteError(_) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Caller-input failures, always raised before any connection is checked out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing to write: an empty record slice or an empty changeset.
    #[error("null value")]
    NullValue,

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    /// `UPDATE`/`DELETE` without a filter would touch the whole table.
    #[error("missing where clause")]
    MissingWhereClause,

    #[error("record yields {values} values for {columns} columns")]
    ColumnCount { columns: usize, values: usize },

    #[error("primary key {0:?} is not one of the record's columns")]
    UnknownPrimaryKey(String),
}

impl<E> From<bb8::RunError<E>> for EngineError
where
    E: std::fmt::Display,
{
    fn from(err: bb8::RunError<E>) -> Self {
        match err {
            bb8::RunError::User(e) => EngineError::Connection(format!("pool checkout error: {e}")),
            bb8::RunError::TimedOut => {
                EngineError::Connection("timed out waiting for a pooled connection".into())
            }
        }
    }
}
