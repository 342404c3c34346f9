use std::future::Future;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};

use bb8::{ManageConnection, Pool, PooledConnection};
use tokio_postgres::{Client, NoTls};

use crate::config::{EngineConfig, InitMode};
use crate::error::EngineError;

pub type PgPooledConnection = PooledConnection<'static, PgManager>;

/// Maintenance database used to probe for and create the target database.
const ADMIN_DATABASE: &str = "postgres";

/// A pooled Postgres client.
///
/// `needs_rollback` is set while a transaction is open on it; a client handed back to the pool
/// with the flag still set is discarded instead of reused.
pub struct PgClient {
    client: Client,
    needs_rollback: AtomicBool,
}

impl PgClient {
    fn new(client: Client) -> Self {
        Self {
            client,
            needs_rollback: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn needs_rollback(&self) -> bool {
        self.needs_rollback.load(Ordering::Acquire)
    }

    pub(crate) fn set_needs_rollback(&self, value: bool) {
        self.needs_rollback.store(value, Ordering::Release);
    }
}

impl Deref for PgClient {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.client
    }
}

/// bb8 manager for Postgres clients.
pub struct PgManager {
    pub(crate) config: tokio_postgres::Config,
}

impl PgManager {
    #[must_use]
    pub fn new(config: tokio_postgres::Config) -> Self {
        Self { config }
    }
}

impl ManageConnection for PgManager {
    type Connection = PgClient;
    type Error = tokio_postgres::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let cfg = self.config.clone();
        async move { connect_client(&cfg).await.map(PgClient::new) }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move { conn.simple_query("SELECT 1").await.map(|_| ()) }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed() || *conn.needs_rollback.get_mut()
    }
}

async fn connect_client(cfg: &tokio_postgres::Config) -> Result<Client, tokio_postgres::Error> {
    let (client, connection) = cfg.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(target: "crud_engine", error = %e, "postgres connection closed");
        }
    });
    Ok(client)
}

fn client_config(config: &EngineConfig, dbname: &str) -> tokio_postgres::Config {
    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host)
        .port(config.port)
        .user(&config.user)
        .dbname(dbname);
    if !config.password.is_empty() {
        pg.password(&config.password);
    }
    pg
}

/// Server-side encoding name for a configured character set.
fn postgres_encoding(charset: &str) -> String {
    match charset.to_ascii_lowercase().as_str() {
        "utf8" | "utf8mb4" | "utf-8" => "UTF8".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Create the configured database through the maintenance database when it is missing.
///
/// # Errors
/// Returns `EngineError::Connection` if the server is unreachable or creation fails.
pub async fn bootstrap(config: &EngineConfig) -> Result<(), EngineError> {
    if config.init_mode == InitMode::AssumeExists {
        return Ok(());
    }
    let admin = connect_client(&client_config(config, ADMIN_DATABASE))
        .await
        .map_err(|e| EngineError::Connection(format!("postgres admin connection error: {e}")))?;

    let exists: i64 = admin
        .query_one(
            "SELECT COUNT(*) FROM pg_database WHERE datname = $1",
            &[&config.database_name],
        )
        .await
        .and_then(|row| row.try_get(0))
        .map_err(|e| EngineError::Connection(format!("postgres database probe error: {e}")))?;
    if exists > 0 {
        return Ok(());
    }

    let ddl = format!(
        "CREATE DATABASE {} ENCODING '{}' TEMPLATE template0",
        quote_identifier(&config.database_name),
        postgres_encoding(&config.charset)
    );
    admin
        .batch_execute(&ddl)
        .await
        .map_err(|e| EngineError::Connection(format!("postgres create database error: {e}")))
}

/// Bootstrap if needed, then build the pool and check one connection out of it.
///
/// # Errors
/// Returns `EngineError::Connection` if the database cannot be reached.
pub async fn build_pool(config: &EngineConfig) -> Result<Pool<PgManager>, EngineError> {
    bootstrap(config).await?;

    let pg_config = client_config(config, &config.database_name);
    connect_client(&pg_config)
        .await
        .map_err(|e| EngineError::Connection(format!("postgres connection error: {e}")))?;

    Pool::builder()
        .max_size(config.max_size())
        .min_idle(config.min_idle())
        .max_lifetime(config.max_lifetime())
        .build(PgManager::new(pg_config))
        .await
        .map_err(|e| EngineError::Connection(format!("postgres pool error: {e}")))
}
