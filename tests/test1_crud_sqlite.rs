#![cfg(feature = "sqlite")]

mod common;

use std::sync::Arc;

use common::{RecordingLogger, Users, open_users_db};
use crud_engine::prelude::*;

#[tokio::test]
async fn users_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let logger = Arc::new(RecordingLogger::default());
    let engine = open_users_db(dir.path(), Arc::clone(&logger)).await?;

    let mut users = vec![Users::named("summer", 1), Users::named("mingyu", 1)];
    engine.create_in_batches("users", &mut users, 2).await?;

    let mut page: Vec<Users> = Vec::new();
    let count = engine
        .query_list("users", "id desc", Pagination::new(1, 1), &mut page, &Filter::none())
        .await?;
    assert_eq!(count, 2);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].en_name, "mingyu");

    let updated = engine
        .update_row(
            "users",
            Changeset::new().set("status", 2_i64),
            &Filter::new("en_name = ?").arg("summer"),
        )
        .await?;
    assert_eq!(updated, 1);

    let mut summer = Users::default();
    let found = engine
        .query_row("users", &mut summer, &Filter::new("en_name = ?").arg("summer"))
        .await?;
    assert!(found);
    assert_eq!(summer.status, 2);
    assert_eq!(summer.password, "summer-pw");

    engine.close()?;
    Ok(())
}

#[tokio::test]
async fn create_then_read_back_is_field_for_field_equal() -> Result<(), Box<dyn std::error::Error>>
{
    let dir = tempfile::tempdir()?;
    let engine = open_users_db(dir.path(), Arc::new(RecordingLogger::default())).await?;

    let mut alden = Users::named("alden", 3);
    engine.create("users", &mut alden).await?;
    assert_eq!(alden.id, 1, "generated key is written back");

    let mut read = Users::default();
    assert!(
        engine
            .query_row("users", &mut read, &Filter::new("id = ?").arg(alden.id))
            .await?
    );
    assert_eq!(read, alden);
    Ok(())
}

#[tokio::test]
async fn generated_keys_are_backfilled_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let engine = open_users_db(dir.path(), Arc::new(RecordingLogger::default())).await?;

    let mut first = Users::named("first", 0);
    engine.create("users", &mut first).await?;

    let mut batch = vec![
        Users::named("a", 0),
        Users::named("b", 0),
        Users::named("c", 0),
    ];
    engine.create_in_batches("users", &mut batch, 2).await?;
    let ids: Vec<i64> = batch.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![2, 3, 4]);

    let mut explicit = Users::named("explicit", 0);
    explicit.id = 40;
    engine.create("users", &mut explicit).await?;
    assert_eq!(explicit.id, 40);

    let mut all: Vec<Users> = Vec::new();
    let count = engine
        .query_all("users", "id", &mut all, &Filter::none())
        .await?;
    assert_eq!(count, 5);
    assert_eq!(all.last().map(|u| u.id), Some(40));
    Ok(())
}

#[tokio::test]
async fn missing_row_is_not_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let engine = open_users_db(dir.path(), Arc::new(RecordingLogger::default())).await?;

    let mut out = Users::named("untouched", 9);
    let found = engine
        .query_row("users", &mut out, &Filter::new("en_name = ?").arg("nobody"))
        .await?;
    assert!(!found);
    assert_eq!(out, Users::named("untouched", 9));

    let deleted = engine
        .delete_row("users", &Filter::new("en_name = ?").arg("nobody"))
        .await?;
    assert_eq!(deleted, 0);
    Ok(())
}

#[tokio::test]
async fn delete_and_update_report_exact_counts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let engine = open_users_db(dir.path(), Arc::new(RecordingLogger::default())).await?;

    let mut users: Vec<Users> = (0..5)
        .map(|i| Users::named(&format!("user{i}"), i % 2))
        .collect();
    engine.create_in_batches("users", &mut users, 5).await?;

    let patch = Users {
        status: 7,
        ..Users::default()
    };
    let updated = engine
        .update_row("users", &patch, &Filter::new("status = ?").arg(1_i64))
        .await?;
    assert_eq!(updated, 2);

    let deleted = engine
        .delete_row("users", &Filter::new("status IN (?, ?)").arg(0_i64).arg(7_i64))
        .await?;
    assert_eq!(deleted, 5);

    let mut rest: Vec<Users> = Vec::new();
    assert_eq!(
        engine
            .query_all("users", "", &mut rest, &Filter::none())
            .await?,
        0
    );
    assert!(rest.is_empty());
    Ok(())
}

#[tokio::test]
async fn record_patch_leaves_zero_fields_alone() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let engine = open_users_db(dir.path(), Arc::new(RecordingLogger::default())).await?;

    let mut mingyu = Users::named("mingyu", 1);
    engine.create("users", &mut mingyu).await?;

    let patch = Users {
        id: 99,
        password: "rotated".into(),
        ..Users::default()
    };
    let filter = Filter::new("id = ?").arg(mingyu.id);
    assert_eq!(engine.update_row("users", &patch, &filter).await?, 1);

    let mut read = Users::default();
    assert!(engine.query_row("users", &mut read, &filter).await?);
    assert_eq!(read.id, mingyu.id);
    assert_eq!(read.en_name, "mingyu");
    assert_eq!(read.password, "rotated");
    assert_eq!(read.status, 1);
    Ok(())
}

#[tokio::test]
async fn every_statement_is_traced() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let logger = Arc::new(RecordingLogger::default());
    let engine = open_users_db(dir.path(), Arc::clone(&logger)).await?;
    let before = logger.trace_count();

    let mut summer = Users::named("summer", 1);
    engine.create("users", &mut summer).await?;
    let mut out = Users::default();
    engine
        .query_row("users", &mut out, &Filter::new("id = ?").arg(summer.id))
        .await?;

    let traces = logger.traces().split_off(before);
    assert_eq!(traces.len(), 2);
    assert!(traces[0].sql.starts_with("INSERT INTO users (en_name, password, status)"));
    assert!(traces[0].sql.ends_with("RETURNING id"));
    assert_eq!(traces[0].rows, 1);
    assert_eq!(
        traces[1].sql,
        "SELECT id, en_name, password, status FROM users WHERE (id = ?) ORDER BY id ASC LIMIT 1 OFFSET 0"
    );
    assert!(traces.iter().all(|t| !t.failed));
    assert!(!logger.messages_at("info").is_empty());
    Ok(())
}
