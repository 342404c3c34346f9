#![cfg(feature = "postgres")]

mod common;

use std::sync::Arc;

use common::{RecordingLogger, Users};
use crud_engine::pool::EnginePool;
use crud_engine::prelude::*;

/// Connection settings come from `CRUD_ENGINE_PG_HOST`, `CRUD_ENGINE_PG_USER` and optionally
/// `CRUD_ENGINE_PG_PASSWORD`; without a host the test is skipped.
fn pg_config(database: &str) -> Option<EngineConfig> {
    let host = std::env::var("CRUD_ENGINE_PG_HOST").ok()?;
    let user = std::env::var("CRUD_ENGINE_PG_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("CRUD_ENGINE_PG_PASSWORD").unwrap_or_default();
    Some(
        EngineConfig::postgres_builder(database)
            .host(host)
            .user(user)
            .password(password)
            .finish(),
    )
}

#[tokio::test]
async fn postgres_users_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let Some(config) = pg_config("crud_engine_test") else {
        eprintln!("CRUD_ENGINE_PG_HOST not set; skipping");
        return Ok(());
    };
    let logger = Arc::new(RecordingLogger::default());
    let engine = Engine::open(config, Arc::clone(&logger) as Arc<dyn QueryLogger>).await?;
    engine
        .execute_batch(
            "DROP TABLE IF EXISTS users;
             CREATE TABLE users (
                 id BIGSERIAL PRIMARY KEY,
                 en_name TEXT NOT NULL UNIQUE,
                 password TEXT NOT NULL DEFAULT '',
                 status INTEGER NOT NULL DEFAULT 0
             );",
        )
        .await?;

    let mut users = vec![Users::named("summer", 1), Users::named("mingyu", 1)];
    engine.create_in_batches("users", &mut users, 2).await?;
    assert!(users.iter().all(|u| u.id > 0));

    let mut page = Vec::new();
    let count = engine
        .query_list("users", "id desc", Pagination::new(1, 1), &mut page, &Filter::none())
        .await?;
    assert_eq!(count, 2);
    assert_eq!(page[0].en_name, "mingyu");

    // status is INTEGER (int4); the i64 argument is narrowed on the wire.
    let updated = engine
        .update_row(
            "users",
            Changeset::new().set("status", 2_i64),
            &Filter::new("en_name = ?").arg("summer"),
        )
        .await?;
    assert_eq!(updated, 1);

    let mut summer = Users::default();
    assert!(
        engine
            .query_row("users", &mut summer, &Filter::new("en_name = ?").arg("summer"))
            .await?
    );
    assert_eq!(summer.status, 2);
    assert!(
        logger
            .traces()
            .iter()
            .any(|t| t.sql.contains("en_name = ?"))
    );

    let mut dupes = vec![Users::named("summer", 1)];
    assert!(
        engine
            .create_in_batches("users", &mut dupes, 1)
            .await
            .is_err_and(|e| e.is_store_error())
    );
    assert_eq!(engine.delete_row("users", &Filter::new("1 = 1")).await?, 2);
    engine.close()?;
    Ok(())
}

#[tokio::test]
async fn postgres_dates_read_as_timestamps() -> Result<(), Box<dyn std::error::Error>> {
    let Some(config) = pg_config("crud_engine_test") else {
        eprintln!("CRUD_ENGINE_PG_HOST not set; skipping");
        return Ok(());
    };
    let pool = EnginePool::connect(&config).await?;
    let session = pool.get_connection().await?;
    let rs = session
        .select(
            "SELECT TIMESTAMPTZ '2024-01-02 03:04:05+00' AS ts, DATE '2024-01-02' AS d",
            &[],
        )
        .await?;
    let row = &rs.results[0];
    assert_eq!(row.get_timestamp("ts")?.to_string(), "2024-01-02 03:04:05");
    assert_eq!(row.get_timestamp("d")?.to_string(), "2024-01-02 00:00:00");
    Ok(())
}

#[tokio::test]
async fn postgres_session_left_in_transaction_is_replaced() -> Result<(), Box<dyn std::error::Error>>
{
    let Some(mut config) = pg_config("crud_engine_test") else {
        eprintln!("CRUD_ENGINE_PG_HOST not set; skipping");
        return Ok(());
    };
    config.max_open_connections = 1;
    let pool = EnginePool::connect(&config).await?;

    let backend_pid = "SELECT pg_backend_pid()::int8 AS pid";
    let session = pool.get_connection().await?;
    session.begin().await?;
    assert!(session.needs_rollback());
    let first = session.select(backend_pid, &[]).await?.results[0].get_int("pid")?;
    drop(session);

    let session = pool.get_connection().await?;
    assert!(!session.needs_rollback());
    let second = session.select(backend_pid, &[]).await?.results[0].get_int("pid")?;
    assert_ne!(first, second);

    session.begin().await?;
    session.rollback().await?;
    assert!(!session.needs_rollback());
    let third = session.select(backend_pid, &[]).await?.results[0].get_int("pid")?;
    assert_eq!(second, third);
    Ok(())
}
