pub mod connection;
pub mod types;

pub use connection::PooledSession;
pub use types::EnginePool;
