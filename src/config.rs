use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::logger::QueryLogger;
use crate::types::Backend;

/// bb8's own default when no open-connection cap is given.
pub const DEFAULT_MAX_OPEN_CONNECTIONS: u32 = 10;

fn default_charset() -> String {
    "utf8".to_string()
}

/// How [`Engine::open`] treats a database that does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitMode {
    /// Probe for the database and create it with the configured character set if absent.
    #[default]
    CreateIfMissing,
    /// The database must already exist; a missing one is a connection error.
    AssumeExists,
}

/// Connection settings, fixed for the lifetime of an [`Engine`].
///
/// For the `SQLite` backend `database_name` is the database file path and the network and
/// credential fields are ignored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub backend: Backend,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default)]
    pub max_idle_connections: u32,
    #[serde(default)]
    pub max_open_connections: u32,
    #[serde(default)]
    pub max_connection_lifetime_seconds: u64,
    pub database_name: String,
    #[serde(default)]
    pub init_mode: InitMode,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("backend", &self.backend)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("charset", &self.charset)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("max_open_connections", &self.max_open_connections)
            .field(
                "max_connection_lifetime_seconds",
                &self.max_connection_lifetime_seconds,
            )
            .field("database_name", &self.database_name)
            .field("init_mode", &self.init_mode)
            .finish()
    }
}

impl EngineConfig {
    fn with_backend(backend: Backend, database_name: String) -> Self {
        Self {
            backend,
            user: String::new(),
            password: String::new(),
            host: String::new(),
            port: 0,
            charset: default_charset(),
            max_idle_connections: 2,
            max_open_connections: DEFAULT_MAX_OPEN_CONNECTIONS,
            max_connection_lifetime_seconds: 0,
            database_name,
            init_mode: InitMode::CreateIfMissing,
        }
    }

    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite_builder(db_path: impl Into<String>) -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::with_backend(Backend::Sqlite, db_path.into()),
        }
    }

    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn postgres_builder(database_name: impl Into<String>) -> EngineConfigBuilder {
        let mut config = Self::with_backend(Backend::Postgres, database_name.into());
        config.host = "localhost".to_string();
        config.port = 5432;
        EngineConfigBuilder { config }
    }

    /// Pool size cap; zero means the pool default.
    #[must_use]
    pub fn max_size(&self) -> u32 {
        if self.max_open_connections == 0 {
            DEFAULT_MAX_OPEN_CONNECTIONS
        } else {
            self.max_open_connections
        }
    }

    /// Idle connections kept warm, never more than the pool can hold.
    #[must_use]
    pub fn min_idle(&self) -> Option<u32> {
        match self.max_idle_connections.min(self.max_size()) {
            0 => None,
            idle => Some(idle),
        }
    }

    /// Connection lifetime; zero means connections are reused forever.
    #[must_use]
    pub fn max_lifetime(&self) -> Option<Duration> {
        match self.max_connection_lifetime_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Checks that must pass before any I/O.
    ///
    /// # Errors
    /// Returns `EngineError::Config` naming the first missing or malformed field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.database_name.trim().is_empty() {
            return Err(EngineError::Config("database_name is required".to_string()));
        }
        if !self
            .charset
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            || self.charset.is_empty()
        {
            return Err(EngineError::Config(format!(
                "invalid character set {:?}",
                self.charset
            )));
        }
        if !self.backend.is_enabled() {
            return Err(EngineError::Config(format!(
                "{:?} support is not compiled in",
                self.backend
            )));
        }
        if self.backend == Backend::Postgres {
            if self.host.is_empty() {
                return Err(EngineError::Config("host is required".to_string()));
            }
            if self.port == 0 {
                return Err(EngineError::Config("port is required".to_string()));
            }
            if self.user.is_empty() {
                return Err(EngineError::Config("user is required".to_string()));
            }
        }
        Ok(())
    }
}

/// Fluent builder for [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.config.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.config.charset = charset.into();
        self
    }

    #[must_use]
    pub fn max_idle_connections(mut self, max_idle: u32) -> Self {
        self.config.max_idle_connections = max_idle;
        self
    }

    #[must_use]
    pub fn max_open_connections(mut self, max_open: u32) -> Self {
        self.config.max_open_connections = max_open;
        self
    }

    #[must_use]
    pub fn max_connection_lifetime_seconds(mut self, seconds: u64) -> Self {
        self.config.max_connection_lifetime_seconds = seconds;
        self
    }

    #[must_use]
    pub fn init_mode(mut self, init_mode: InitMode) -> Self {
        self.config.init_mode = init_mode;
        self
    }

    #[must_use]
    pub fn finish(self) -> EngineConfig {
        self.config
    }

    /// Open an [`Engine`] with this configuration.
    ///
    /// # Errors
    /// Returns `EngineError::Config` or `EngineError::Connection` as [`Engine::open`] does.
    pub async fn open(self, logger: Arc<dyn QueryLogger>) -> Result<Engine, EngineError> {
        Engine::open(self.finish(), logger).await
    }
}
