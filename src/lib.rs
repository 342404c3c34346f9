//! A backend-agnostic CRUD engine over a pooled relational database.
//!
//! Callers describe rows with the [`Record`] trait, open an [`Engine`] from an
//! [`EngineConfig`], and run create, read, update and delete operations against named tables.
//! Writes run inside a transaction on one pooled connection; reads run directly on the pool.
//!
//! Backends are selected by cargo feature: `sqlite` (default, `rusqlite`) and `postgres`
//! (`tokio-postgres`). Both are pooled with `bb8`.

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("crud-engine needs at least one backend feature: `sqlite` or `postgres`");

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod logger;
pub mod page;
pub mod pool;
pub mod prelude;
pub mod record;
pub mod results;
pub mod sql;
pub mod translation;
pub mod types;
pub mod validation;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{EngineConfig, EngineConfigBuilder, InitMode};
pub use engine::Engine;
pub use error::{EngineError, ValidationError};
pub use filter::Filter;
pub use logger::{LogLevel, QueryLogger, TracingLogger};
pub use page::Pagination;
pub use record::{Changeset, Record};
pub use results::{CustomDbRow, ResultSet};
pub use types::{Backend, RowValues};
