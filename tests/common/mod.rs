#![allow(dead_code)]

#[cfg(feature = "sqlite")]
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use crud_engine::logger::SqlProducer;
use crud_engine::prelude::*;

pub const USERS_DDL: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    en_name TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL DEFAULT '',
    status INTEGER NOT NULL DEFAULT 0
);";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Users {
    pub id: i64,
    pub en_name: String,
    pub password: String,
    pub status: i64,
}

impl Users {
    pub fn named(en_name: &str, status: i64) -> Self {
        Self {
            id: 0,
            en_name: en_name.to_string(),
            password: format!("{en_name}-pw"),
            status,
        }
    }
}

impl Record for Users {
    fn columns() -> &'static [&'static str] {
        &["id", "en_name", "password", "status"]
    }

    fn primary_key() -> Option<&'static str> {
        Some("id")
    }

    fn values(&self) -> Vec<RowValues> {
        vec![
            self.id.into(),
            (&self.en_name).into(),
            (&self.password).into(),
            self.status.into(),
        ]
    }

    fn from_row(row: &CustomDbRow) -> Result<Self, EngineError> {
        Ok(Self {
            id: row.get_int("id")?,
            en_name: row.get_text("en_name")?,
            password: row.get_text("password")?,
            status: row.get_int("status")?,
        })
    }

    fn set_primary_key(&mut self, key: &RowValues) {
        if let Some(id) = key.as_int() {
            self.id = *id;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub sql: String,
    pub rows: u64,
    pub failed: bool,
}

/// Logger that keeps every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    pub traces: Mutex<Vec<Trace>>,
    pub messages: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingLogger {
    pub fn traces(&self) -> Vec<Trace> {
        self.traces.lock().expect("traces lock").clone()
    }

    pub fn trace_count(&self) -> usize {
        self.traces.lock().expect("traces lock").len()
    }

    pub fn messages_at(&self, level: &str) -> Vec<String> {
        self.messages
            .lock()
            .expect("messages lock")
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, level: &'static str, message: &str) {
        self.messages
            .lock()
            .expect("messages lock")
            .push((level, message.to_string()));
    }
}

impl QueryLogger for RecordingLogger {
    fn info(&self, message: &str) {
        self.push("info", message);
    }

    fn warn(&self, message: &str) {
        self.push("warn", message);
    }

    fn error(&self, message: &str) {
        self.push("error", message);
    }

    fn trace(&self, _begin: Instant, sql: SqlProducer<'_>, err: Option<&EngineError>) {
        let (sql, rows) = sql();
        self.traces.lock().expect("traces lock").push(Trace {
            sql,
            rows,
            failed: err.is_some(),
        });
    }
}

#[cfg(feature = "sqlite")]
pub fn db_path(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

/// Open a fresh database file under `dir` with the `users` table created.
#[cfg(feature = "sqlite")]
pub async fn open_users_db(
    dir: &Path,
    logger: std::sync::Arc<RecordingLogger>,
) -> Result<Engine, EngineError> {
    let engine = EngineConfig::sqlite_builder(db_path(dir, "users.db"))
        .max_open_connections(4)
        .open(logger)
        .await?;
    engine.execute_batch(USERS_DDL).await?;
    Ok(engine)
}
