//! The logging collaborator the engine reports to.
//!
//! The engine never writes log output itself. It raises events on a [`QueryLogger`] handed to
//! [`Engine::open`](crate::Engine::open); [`TracingLogger`] forwards them to `tracing`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Lazily yields the executed SQL text and the number of rows it affected or returned.
pub type SqlProducer<'a> = &'a dyn Fn() -> (String, u64);

/// Receiver for engine events.
pub trait QueryLogger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);

    /// Called once per executed statement. `sql` is only invoked if the event is emitted.
    fn trace(&self, begin: Instant, sql: SqlProducer<'_>, err: Option<&EngineError>);
}

/// Verbosity of [`TracingLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent,
    Error,
    #[default]
    Warn,
    Info,
}

/// [`QueryLogger`] backed by `tracing` events under the `crud_engine` target.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    level: LogLevel,
    slow_threshold: Option<Duration>,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            slow_threshold: Some(Duration::from_millis(200)),
        }
    }
}

impl TracingLogger {
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Statements slower than `threshold` are reported at warn level; `None` disables it.
    #[must_use]
    pub fn with_slow_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.slow_threshold = threshold;
        self
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn enabled(&self, level: LogLevel) -> bool {
        self.level >= level && level != LogLevel::Silent
    }
}

impl QueryLogger for TracingLogger {
    fn info(&self, message: &str) {
        if self.enabled(LogLevel::Info) {
            tracing::info!(target: "crud_engine", "{message}");
        }
    }

    fn warn(&self, message: &str) {
        if self.enabled(LogLevel::Warn) {
            tracing::warn!(target: "crud_engine", "{message}");
        }
    }

    fn error(&self, message: &str) {
        if self.enabled(LogLevel::Error) {
            tracing::error!(target: "crud_engine", "{message}");
        }
    }

    fn trace(&self, begin: Instant, sql: SqlProducer<'_>, err: Option<&EngineError>) {
        if self.level == LogLevel::Silent {
            return;
        }
        let elapsed = begin.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        match err {
            Some(err) if self.enabled(LogLevel::Error) => {
                let (sql, rows) = sql();
                tracing::error!(
                    target: "crud_engine",
                    sql = %sql,
                    rows,
                    elapsed_ms,
                    error = %err,
                    "statement failed"
                );
            }
            Some(_) => {}
            None if self.slow_threshold.is_some_and(|t| elapsed > t)
                && self.enabled(LogLevel::Warn) =>
            {
                let (sql, rows) = sql();
                tracing::warn!(
                    target: "crud_engine",
                    sql = %sql,
                    rows,
                    elapsed_ms,
                    "SLOW SQL >= {:?}",
                    self.slow_threshold.unwrap_or_default()
                );
            }
            None if self.enabled(LogLevel::Info) => {
                let (sql, rows) = sql();
                tracing::info!(target: "crud_engine", sql = %sql, rows, elapsed_ms, "statement executed");
            }
            None => {}
        }
    }
}
