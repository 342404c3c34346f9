// Postgres backend: bb8-pooled tokio-postgres clients.
//
// - config: connection manager, database bootstrap and pool setup
// - params: RowValues as tokio-postgres parameters
// - query: result extraction
// - executor: statement execution

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{PgClient, PgManager, PgPooledConnection, build_pool};
pub use executor::{dml, execute_batch, select};
