use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One prescribed movement within a workout plan, supplied by an external
/// generator. Immutable for the lifetime of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub muscle: String,
    pub sets: u32,
    /// Target reps as written in the plan ("8", "8-12", "AMRAP").
    pub reps: String,
    /// Suggested working weight. None for bodyweight movements.
    pub weight: Option<f32>,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub tip: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// An ordered list of exercises to run a session from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub name: String,
    pub description: Option<String>,
    pub exercises: Vec<Exercise>,
}

/// One attempt slot at an exercise. Records are created up front with
/// `completed = false` and written exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRecord {
    /// 0-based position within its exercise.
    pub index: usize,
    pub completed: bool,
    pub reps: Option<u32>,
    /// Weight used, in the caller's unit system. A skipped set stores 0.
    pub weight: Option<f32>,
    /// Set when `completed` flips to true, never mutated afterwards.
    pub logged_at: Option<DateTime<Local>>,
}

impl SetRecord {
    pub fn fresh(index: usize) -> Self {
        Self {
            index,
            completed: false,
            reps: None,
            weight: None,
            logged_at: None,
        }
    }
}

/// An exercise plus its per-set records for the running session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub exercise: Exercise,
    pub sets: Vec<SetRecord>,
}

impl ExerciseProgress {
    /// Builds the progress entry with one fresh record per prescribed set.
    pub fn from_exercise(exercise: Exercise) -> Self {
        let sets = (0..exercise.sets as usize).map(SetRecord::fresh).collect();
        Self { exercise, sets }
    }

    pub fn all_sets_completed(&self) -> bool {
        self.sets.iter().all(|s| s.completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Countdown between sets, independent of the overall session clock.
/// At most one exists per session; starting a new one replaces it outright.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestTimerState {
    pub active: bool,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
}

/// One complete guided-workout attempt, from start to completion or
/// cancellation. The single mutable object for the session's lifetime;
/// frozen the instant `status` leaves `Active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub workout: String,
    pub exercises: Vec<ExerciseProgress>,
    pub started_at: DateTime<Local>,
    pub current_exercise_index: usize,
    pub current_set_index: usize,
    pub rest_timer: RestTimerState,
    pub status: SessionStatus,
}

impl Session {
    pub fn current_exercise(&self) -> &ExerciseProgress {
        &self.exercises[self.current_exercise_index]
    }

    /// Advisory only: the session can always be finished early.
    pub fn is_finishable(&self) -> bool {
        self.exercises
            .last()
            .map(|e| e.all_sets_completed())
            .unwrap_or(false)
    }
}

/// Derived once, at the active → completed transition. The computed fields
/// never change; rating and note may be attached at that same moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub duration_seconds: i64,
    pub completed_exercises: usize,
    pub total_volume: f32,
    pub estimated_calories: u32,
    pub rating: Option<u8>,
    pub note: Option<String>,
}
