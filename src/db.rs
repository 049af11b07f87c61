use std::str::FromStr;

use anyhow::Result;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

pub async fn open(path: &str) -> Result<DB> {
    let opts = SqliteConnectOptions::from_str(path)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plans (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL UNIQUE,
            payload    TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS active_sessions (
            user_id    TEXT NOT NULL,
            day        TEXT NOT NULL,
            payload    TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, day)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workout_history (
            id                  TEXT PRIMARY KEY,
            user_id             TEXT NOT NULL,
            day                 TEXT NOT NULL,
            workout             TEXT NOT NULL,
            session_payload     TEXT NOT NULL,
            duration_seconds    INTEGER NOT NULL,
            completed_exercises INTEGER NOT NULL,
            exercise_count      INTEGER NOT NULL,
            total_volume        REAL NOT NULL,
            estimated_calories  INTEGER NOT NULL,
            rating              INTEGER,
            note                TEXT,
            archived_at         TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
