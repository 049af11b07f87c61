use thiserror::Error;

use crate::models::SessionStatus;

/// Errors raised by the session engine. All of them are synchronous and
/// returned at the call site; no operation partially applies.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("set {set} of exercise {exercise} is already logged")]
    SetAlreadyLogged { exercise: usize, set: usize },

    #[error("index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("exercise {index} is not the current exercise ({current})")]
    ExerciseNotCurrent { index: usize, current: usize },

    #[error("rating {rating} is out of range (1-5)")]
    InvalidRating { rating: u8 },

    #[error("operation not allowed while session is {status}")]
    InvalidStateTransition { status: SessionStatus },

    /// Non-fatal: the in-memory session stays authoritative when a
    /// persistence write fails.
    #[error("persistence write failed: {0}")]
    PersistenceWrite(String),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceWrite(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::PersistenceWrite(err.to_string())
    }
}
