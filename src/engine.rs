use chrono::Local;
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{
    CompletionSummary, ExerciseProgress, RestTimerState, Session, SessionStatus, WorkoutPlan,
};
use crate::summary;
use crate::timer::RestTick;

/// The sole mutator of session state. Callers hold the engine and route
/// every mutation through its operations; each call either applies its full
/// transition (cursor + record + optional timer start) or none of it.
#[derive(Debug)]
pub struct SessionEngine {
    session: Session,
    /// Rest duration started automatically after a logged set, when
    /// configured. None disables the automatic timer.
    rest_policy: Option<u32>,
}

impl SessionEngine {
    /// Builds a fresh session from a plan: one progress entry per exercise,
    /// every set record created eagerly, cursor at (0, 0).
    pub fn start(plan: &WorkoutPlan, rest_policy: Option<u32>) -> Result<Self, EngineError> {
        if plan.exercises.is_empty() {
            return Err(EngineError::InvalidPlan(format!(
                "plan `{}` has no exercises",
                plan.name
            )));
        }
        if let Some(ex) = plan.exercises.iter().find(|e| e.sets == 0) {
            return Err(EngineError::InvalidPlan(format!(
                "exercise `{}` prescribes zero sets",
                ex.name
            )));
        }

        let session = Session {
            id: Uuid::new_v4().to_string(),
            workout: plan.name.clone(),
            exercises: plan
                .exercises
                .iter()
                .cloned()
                .map(ExerciseProgress::from_exercise)
                .collect(),
            started_at: Local::now(),
            current_exercise_index: 0,
            current_set_index: 0,
            rest_timer: RestTimerState::default(),
            status: SessionStatus::Active,
        };

        Ok(Self {
            session,
            rest_policy,
        })
    }

    /// Picks an interrupted session back up, e.g. after an app restart.
    /// The document comes from outside, so the structural invariants are
    /// re-checked before any cursor math can run on it.
    pub fn resume(session: Session, rest_policy: Option<u32>) -> Result<Self, EngineError> {
        if session.status != SessionStatus::Active {
            return Err(EngineError::InvalidStateTransition {
                status: session.status,
            });
        }

        let len = session.exercises.len();
        if len == 0 {
            return Err(EngineError::InvalidPlan(
                "session document has no exercises".to_string(),
            ));
        }
        if session.current_exercise_index >= len {
            return Err(EngineError::IndexOutOfRange {
                index: session.current_exercise_index,
                len,
            });
        }
        let sets = session.exercises[session.current_exercise_index].sets.len();
        if session.current_set_index >= sets {
            return Err(EngineError::IndexOutOfRange {
                index: session.current_set_index,
                len: sets,
            });
        }

        Ok(Self {
            session,
            rest_policy,
        })
    }

    /// Read-only projection for rendering.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Records reps and weight for the current set of `exercise_index`, then
    /// advances the set cursor and, when a rest policy is configured and the
    /// exercise has sets left, starts the rest timer. Sets are write-once.
    pub fn log_set(
        &mut self,
        exercise_index: usize,
        reps: u32,
        weight: f32,
    ) -> Result<(), EngineError> {
        self.complete_current_set(exercise_index, reps, weight, true)
    }

    /// Marks the current set completed with zero reps and zero weight.
    /// Distinguishable from a logged set only by those zero values.
    pub fn skip_set(&mut self, exercise_index: usize) -> Result<(), EngineError> {
        self.complete_current_set(exercise_index, 0, 0.0, false)
    }

    fn complete_current_set(
        &mut self,
        exercise_index: usize,
        reps: u32,
        weight: f32,
        start_rest: bool,
    ) -> Result<(), EngineError> {
        self.ensure_active()?;

        let len = self.session.exercises.len();
        if exercise_index >= len {
            return Err(EngineError::IndexOutOfRange {
                index: exercise_index,
                len,
            });
        }
        if exercise_index != self.session.current_exercise_index {
            return Err(EngineError::ExerciseNotCurrent {
                index: exercise_index,
                current: self.session.current_exercise_index,
            });
        }

        let set_index = self.session.current_set_index;
        let progress = &self.session.exercises[exercise_index];
        if progress.sets[set_index].completed {
            return Err(EngineError::SetAlreadyLogged {
                exercise: exercise_index,
                set: set_index,
            });
        }

        // Validation is done; apply the whole transition.
        let last_set = set_index + 1 == progress.sets.len();
        let set = &mut self.session.exercises[exercise_index].sets[set_index];
        set.completed = true;
        set.reps = Some(reps);
        set.weight = Some(weight);
        set.logged_at = Some(Local::now());

        if !last_set {
            self.session.current_set_index += 1;
            if start_rest {
                if let Some(secs) = self.rest_policy {
                    self.session.rest_timer.start(secs);
                }
            }
        }

        Ok(())
    }

    /// Moves to the next exercise, clamped at the end. Free navigation:
    /// never requires the current exercise to be finished.
    pub fn next_exercise(&mut self) -> Result<(), EngineError> {
        self.ensure_active()?;
        let last = self.session.exercises.len() - 1;
        let target = (self.session.current_exercise_index + 1).min(last);
        self.move_cursor(target);
        Ok(())
    }

    /// Moves to the previous exercise, clamped at the start.
    pub fn prev_exercise(&mut self) -> Result<(), EngineError> {
        self.ensure_active()?;
        let target = self.session.current_exercise_index.saturating_sub(1);
        self.move_cursor(target);
        Ok(())
    }

    /// Direct cursor set, bounds-checked.
    pub fn jump_to_exercise(&mut self, index: usize) -> Result<(), EngineError> {
        self.ensure_active()?;
        let len = self.session.exercises.len();
        if index >= len {
            return Err(EngineError::IndexOutOfRange { index, len });
        }
        self.move_cursor(index);
        Ok(())
    }

    /// The set cursor resets on any exercise change, regardless of
    /// direction. Completed records are never touched by navigation.
    fn move_cursor(&mut self, target: usize) {
        if target != self.session.current_exercise_index {
            self.session.current_exercise_index = target;
            self.session.current_set_index = 0;
        }
    }

    /// Starts a rest countdown independent of the exercise/set cursor,
    /// replacing any timer already running.
    pub fn start_rest_timer(&mut self, duration_seconds: u32) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.session.rest_timer.start(duration_seconds);
        Ok(())
    }

    /// Idempotent manual skip of the rest countdown.
    pub fn stop_rest_timer(&mut self) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.session.rest_timer.skip();
        Ok(())
    }

    /// Advances the rest countdown by one second on behalf of the host
    /// loop. Touches only the timer, never the cursor.
    pub fn tick_rest_timer(&mut self) -> Result<RestTick, EngineError> {
        self.ensure_active()?;
        Ok(self.session.rest_timer.tick())
    }

    /// Immediate and terminal. No summary is produced; discarding any
    /// persisted partial state is the caller's job.
    pub fn cancel_session(&mut self) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.session.status = SessionStatus::Cancelled;
        Ok(())
    }

    /// Finishes the session, even partially completed, producing the one
    /// and only summary. Rating and note ride along without touching the
    /// computed fields.
    pub fn complete_session(
        &mut self,
        rating: Option<u8>,
        note: Option<String>,
    ) -> Result<CompletionSummary, EngineError> {
        self.ensure_active()?;
        if let Some(r) = rating {
            if !(1..=5).contains(&r) {
                return Err(EngineError::InvalidRating { rating: r });
            }
        }

        let mut summary = summary::compute(&self.session, Local::now());
        summary.rating = rating;
        summary.note = note;

        self.session.status = SessionStatus::Completed;
        self.session.rest_timer.skip();
        Ok(summary)
    }

    fn ensure_active(&self) -> Result<(), EngineError> {
        if self.session.status != SessionStatus::Active {
            return Err(EngineError::InvalidStateTransition {
                status: self.session.status,
            });
        }
        Ok(())
    }
}
