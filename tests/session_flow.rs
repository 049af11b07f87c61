use assert_matches::assert_matches;
use chrono::Local;

use setflow::engine::SessionEngine;
use setflow::error::EngineError;
use setflow::models::{Exercise, SessionStatus, WorkoutPlan};
use setflow::storage::{MemoryGateway, SessionGateway};
use setflow::timer::RestTick;

fn exercise(name: &str, sets: u32, weight: Option<f32>) -> Exercise {
    Exercise {
        name: name.into(),
        muscle: "chest".into(),
        sets,
        reps: "10".into(),
        weight,
        instructions: "Keep your shoulder blades pinned.".into(),
        tip: "Pause at the bottom.".into(),
        alternatives: vec!["Dumbbell Press".into()],
    }
}

fn push_day() -> WorkoutPlan {
    WorkoutPlan {
        name: "Push Day".into(),
        description: Some("Chest focus".into()),
        exercises: vec![
            exercise("Bench Press", 3, Some(60.0)),
            exercise("Dips", 2, None),
        ],
    }
}

#[tokio::test]
async fn guided_session_survives_an_interruption() {
    let gateway = MemoryGateway::new();
    let user = "anna";
    let day = Local::now().date_naive();

    let mut engine = SessionEngine::start(&push_day(), Some(90)).unwrap();
    gateway.save_session(user, day, engine.session()).await.unwrap();

    engine.log_set(0, 10, 60.0).unwrap();
    gateway.save_session(user, day, engine.session()).await.unwrap();
    engine.log_set(0, 9, 60.0).unwrap();
    gateway.save_session(user, day, engine.session()).await.unwrap();

    assert_eq!(gateway.save_count(), 3);

    // App restart: everything comes back through the gateway.
    drop(engine);
    let restored = gateway.load_active_session(user, day).await.unwrap().unwrap();
    let mut engine = SessionEngine::resume(restored, Some(90)).unwrap();

    let s = engine.session();
    assert_eq!(s.current_set_index, 2);
    assert!(s.exercises[0].sets[0].completed);
    assert!(s.exercises[0].sets[1].completed);
    assert!(s.rest_timer.active); // countdown state survives too

    engine.log_set(0, 8, 60.0).unwrap();
    engine.next_exercise().unwrap();
    engine.log_set(1, 12, 0.0).unwrap();
    engine.log_set(1, 10, 0.0).unwrap();
    assert!(engine.session().is_finishable());

    let summary = engine.complete_session(Some(5), None).unwrap();
    gateway
        .archive_completed(user, day, engine.session(), &summary)
        .await
        .unwrap();

    assert_eq!(summary.completed_exercises, 2);
    assert_eq!(summary.total_volume, (10 + 9 + 8) as f32 * 60.0);
    assert_eq!(gateway.archived_count(), 1);
    assert!(gateway.load_active_session(user, day).await.unwrap().is_none());
}

#[tokio::test]
async fn log_skip_log_produces_the_documented_totals() {
    let plan = WorkoutPlan {
        name: "Quick Bench".into(),
        description: None,
        exercises: vec![exercise("Bench Press", 3, Some(50.0))],
    };

    let mut engine = SessionEngine::start(&plan, None).unwrap();
    engine.log_set(0, 10, 50.0).unwrap();
    engine.skip_set(0).unwrap();
    engine.log_set(0, 8, 50.0).unwrap();

    assert!(engine.session().exercises[0].all_sets_completed());

    let summary = engine.complete_session(None, None).unwrap();
    assert_eq!(summary.total_volume, 900.0);
    assert_eq!(summary.completed_exercises, 1);
    assert_eq!(engine.session().status, SessionStatus::Completed);
}

#[tokio::test]
async fn cancelling_discards_the_partial_document() {
    let gateway = MemoryGateway::new();
    let user = "anna";
    let day = Local::now().date_naive();

    let mut engine = SessionEngine::start(&push_day(), None).unwrap();
    engine.log_set(0, 10, 60.0).unwrap();
    gateway.save_session(user, day, engine.session()).await.unwrap();

    engine.cancel_session().unwrap();
    gateway.discard_active(user, day).await.unwrap();

    assert_eq!(engine.session().status, SessionStatus::Cancelled);
    assert!(gateway.load_active_session(user, day).await.unwrap().is_none());
    assert_eq!(gateway.archived_count(), 0);

    assert_matches!(
        engine.log_set(0, 10, 60.0),
        Err(EngineError::InvalidStateTransition {
            status: SessionStatus::Cancelled
        })
    );
}

#[tokio::test]
async fn rest_countdown_never_blocks_logging() {
    let mut engine = SessionEngine::start(&push_day(), Some(60)).unwrap();

    engine.log_set(0, 10, 60.0).unwrap();
    assert!(engine.session().rest_timer.active);

    // A few seconds pass...
    assert_eq!(engine.tick_rest_timer().unwrap(), RestTick::Running(59));
    assert_eq!(engine.tick_rest_timer().unwrap(), RestTick::Running(58));

    // ...and the user logs the next set anyway. The log restarts the
    // countdown per the rest policy; nothing about it blocked the log.
    engine.log_set(0, 9, 60.0).unwrap();
    assert_eq!(engine.session().current_set_index, 2);
    assert_eq!(engine.session().rest_timer.remaining_seconds, 60);

    // Navigation is equally free while resting.
    engine.next_exercise().unwrap();
    assert!(engine.session().rest_timer.active);
    assert_eq!(engine.session().current_set_index, 0);
}

#[tokio::test]
async fn persistence_failures_leave_memory_authoritative() {
    // The gateway contract: a failed save is reported, never applied
    // retroactively. Completing against a fresh gateway still works even
    // if no save ever succeeded.
    let gateway = MemoryGateway::new();
    let user = "anna";
    let day = Local::now().date_naive();

    let mut engine = SessionEngine::start(&push_day(), None).unwrap();
    engine.log_set(0, 10, 60.0).unwrap();

    // No save_session calls happened; memory still drives completion.
    let summary = engine.complete_session(None, Some("offline".into())).unwrap();
    gateway
        .archive_completed(user, day, engine.session(), &summary)
        .await
        .unwrap();

    assert_eq!(gateway.archived_count(), 1);
    assert_eq!(summary.note.as_deref(), Some("offline"));
}
