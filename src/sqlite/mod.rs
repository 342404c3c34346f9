// SQLite backend: bb8-pooled rusqlite connections driven on the blocking pool.
//
// - config: connection manager, database bootstrap and pool setup
// - params: RowValues to rusqlite value conversion
// - query: result extraction
// - executor: statement execution

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{SqliteManager, SqlitePooledConnection, build_pool};
pub use executor::{dml, execute_batch, select};
