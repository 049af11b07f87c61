use chrono::{DateTime, Local};

use crate::models::{CompletionSummary, Session};
use crate::timer::session_elapsed_seconds;

// Calorie policy: a flat strength-training burn per elapsed minute plus a
// small bump per completed set. Tunable constants, no external lookup, so
// the calculator stays pure and testable.
const CALORIES_PER_MINUTE: f32 = 4.5;
const CALORIES_PER_SET: f32 = 1.5;

/// Computes the completion metrics for a finished session. Pure: depends
/// only on the session contents and the supplied `now`.
pub fn compute(session: &Session, now: DateTime<Local>) -> CompletionSummary {
    let duration_seconds = session_elapsed_seconds(session.started_at, now);

    let completed_exercises = session
        .exercises
        .iter()
        .filter(|e| e.all_sets_completed())
        .count();

    // Skipped sets carry reps=0/weight=0 and so contribute nothing here.
    let total_volume: f32 = session
        .exercises
        .iter()
        .flat_map(|e| e.sets.iter())
        .filter(|s| s.completed)
        .map(|s| s.reps.unwrap_or(0) as f32 * s.weight.unwrap_or(0.0))
        .sum();

    let completed_sets = session
        .exercises
        .iter()
        .flat_map(|e| e.sets.iter())
        .filter(|s| s.completed)
        .count();

    CompletionSummary {
        duration_seconds,
        completed_exercises,
        total_volume,
        estimated_calories: estimate_calories(duration_seconds, completed_sets),
        rating: None,
        note: None,
    }
}

/// Linear in both inputs, so longer or denser sessions never report less.
pub fn estimate_calories(duration_seconds: i64, completed_sets: usize) -> u32 {
    let minutes = duration_seconds as f32 / 60.0;
    (minutes * CALORIES_PER_MINUTE + completed_sets as f32 * CALORIES_PER_SET).round() as u32
}
