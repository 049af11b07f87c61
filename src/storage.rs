use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{CompletionSummary, Session};

/// Durable store keyed by user+day. The engine writes through after every
/// mutation and never retries; a failed save is surfaced to the caller as a
/// non-fatal warning while the in-memory session stays authoritative.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Fetches the in-progress session for resuming after an interruption.
    async fn load_active_session(
        &self,
        user: &str,
        day: NaiveDate,
    ) -> Result<Option<Session>, EngineError>;

    /// Write-through snapshot; a crash loses at most the in-flight call.
    async fn save_session(
        &self,
        user: &str,
        day: NaiveDate,
        session: &Session,
    ) -> Result<(), EngineError>;

    /// Called exactly once, at the active → completed transition. Removes
    /// the active document and writes the finished workout as history.
    async fn archive_completed(
        &self,
        user: &str,
        day: NaiveDate,
        session: &Session,
        summary: &CompletionSummary,
    ) -> Result<(), EngineError>;

    /// Drops the active document. The engine does not call this on cancel;
    /// honoring the discard is the caller's contract.
    async fn discard_active(&self, user: &str, day: NaiveDate) -> Result<(), EngineError>;
}

/// Production gateway: sessions stored as JSON documents in SQLite.
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionGateway for SqliteGateway {
    async fn load_active_session(
        &self,
        user: &str,
        day: NaiveDate,
    ) -> Result<Option<Session>, EngineError> {
        let payload: Option<String> = sqlx::query_scalar(
            "SELECT payload FROM active_sessions WHERE user_id = ? AND day = ?",
        )
        .bind(user)
        .bind(day.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save_session(
        &self,
        user: &str,
        day: NaiveDate,
        session: &Session,
    ) -> Result<(), EngineError> {
        let payload = serde_json::to_string(session)?;
        sqlx::query(
            r#"
            INSERT INTO active_sessions (user_id, day, payload, updated_at)
            VALUES (?, ?, ?, datetime('now'))
            ON CONFLICT (user_id, day) DO UPDATE
            SET payload = excluded.payload, updated_at = datetime('now')
            "#,
        )
        .bind(user)
        .bind(day.to_string())
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn archive_completed(
        &self,
        user: &str,
        day: NaiveDate,
        session: &Session,
        summary: &CompletionSummary,
    ) -> Result<(), EngineError> {
        let payload = serde_json::to_string(session)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM active_sessions WHERE user_id = ? AND day = ?")
            .bind(user)
            .bind(day.to_string())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO workout_history
              (id, user_id, day, workout, session_payload,
               duration_seconds, completed_exercises, exercise_count,
               total_volume, estimated_calories, rating, note, archived_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, datetime('now'))
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user)
        .bind(day.to_string())
        .bind(&session.workout)
        .bind(payload)
        .bind(summary.duration_seconds)
        .bind(summary.completed_exercises as i64)
        .bind(session.exercises.len() as i64)
        .bind(summary.total_volume)
        .bind(summary.estimated_calories as i64)
        .bind(summary.rating.map(|r| r as i64))
        .bind(summary.note.as_deref())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn discard_active(&self, user: &str, day: NaiveDate) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM active_sessions WHERE user_id = ? AND day = ?")
            .bind(user)
            .bind(day.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// In-memory gateway for tests: same contract, no database.
#[derive(Default)]
pub struct MemoryGateway {
    active: Mutex<HashMap<(String, String), String>>,
    archived: Mutex<Vec<(Session, CompletionSummary)>>,
    saves: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write-through saves seen so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn archived_count(&self) -> usize {
        self.archived.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionGateway for MemoryGateway {
    async fn load_active_session(
        &self,
        user: &str,
        day: NaiveDate,
    ) -> Result<Option<Session>, EngineError> {
        let map = self.active.lock().unwrap();
        match map.get(&(user.to_string(), day.to_string())) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn save_session(
        &self,
        user: &str,
        day: NaiveDate,
        session: &Session,
    ) -> Result<(), EngineError> {
        let json = serde_json::to_string(session)?;
        self.active
            .lock()
            .unwrap()
            .insert((user.to_string(), day.to_string()), json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn archive_completed(
        &self,
        user: &str,
        day: NaiveDate,
        session: &Session,
        summary: &CompletionSummary,
    ) -> Result<(), EngineError> {
        self.active
            .lock()
            .unwrap()
            .remove(&(user.to_string(), day.to_string()));
        self.archived
            .lock()
            .unwrap()
            .push((session.clone(), summary.clone()));
        Ok(())
    }

    async fn discard_active(&self, user: &str, day: NaiveDate) -> Result<(), EngineError> {
        self.active
            .lock()
            .unwrap()
            .remove(&(user.to_string(), day.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::engine::SessionEngine;
    use crate::models::{Exercise, WorkoutPlan};
    use chrono::Local;

    fn plan() -> WorkoutPlan {
        WorkoutPlan {
            name: "Pull Day".into(),
            description: None,
            exercises: vec![Exercise {
                name: "Rows".into(),
                muscle: "back".into(),
                sets: 2,
                reps: "8".into(),
                weight: Some(40.0),
                instructions: String::new(),
                tip: String::new(),
                alternatives: vec![],
            }],
        }
    }

    #[tokio::test]
    async fn sqlite_gateway_round_trips_an_active_session() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("setflow.db");
        let pool = db::open(db_path.to_str().unwrap()).await.unwrap();
        let gateway = SqliteGateway::new(pool);

        let user = "local";
        let day = Local::now().date_naive();
        assert!(gateway.load_active_session(user, day).await.unwrap().is_none());

        let mut engine = SessionEngine::start(&plan(), None).unwrap();
        engine.log_set(0, 8, 40.0).unwrap();
        gateway.save_session(user, day, engine.session()).await.unwrap();

        let loaded = gateway.load_active_session(user, day).await.unwrap().unwrap();
        assert_eq!(loaded.workout, "Pull Day");
        assert_eq!(loaded.current_set_index, 1);
        assert!(loaded.exercises[0].sets[0].completed);
    }

    #[tokio::test]
    async fn sqlite_archive_clears_the_active_document() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("setflow.db");
        let pool = db::open(db_path.to_str().unwrap()).await.unwrap();
        let gateway = SqliteGateway::new(pool.clone());

        let user = "local";
        let day = Local::now().date_naive();

        let mut engine = SessionEngine::start(&plan(), None).unwrap();
        engine.log_set(0, 8, 40.0).unwrap();
        gateway.save_session(user, day, engine.session()).await.unwrap();

        let summary = engine.complete_session(Some(5), None).unwrap();
        gateway
            .archive_completed(user, day, engine.session(), &summary)
            .await
            .unwrap();

        assert!(gateway.load_active_session(user, day).await.unwrap().is_none());

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_history")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let (volume, rating): (f32, Option<i64>) =
            sqlx::query_as("SELECT total_volume, rating FROM workout_history")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(volume, 320.0);
        assert_eq!(rating, Some(5));
    }

    #[tokio::test]
    async fn discard_drops_only_the_targeted_document() {
        let gateway = MemoryGateway::new();
        let day = Local::now().date_naive();

        let engine = SessionEngine::start(&plan(), None).unwrap();
        gateway.save_session("a", day, engine.session()).await.unwrap();
        gateway.save_session("b", day, engine.session()).await.unwrap();

        gateway.discard_active("a", day).await.unwrap();
        assert!(gateway.load_active_session("a", day).await.unwrap().is_none());
        assert!(gateway.load_active_session("b", day).await.unwrap().is_some());
    }
}
