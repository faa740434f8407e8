//! crates/program_core/src/error.rs
//!
//! The business error taxonomy raised by the program engine.

use crate::domain::DayNumber;
use crate::ports::PortError;

/// Errors raised by engine operations. Each variant maps to one stable HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// Malformed, missing or out-of-range input.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A gating rule failed; `blocking_day` is the first day that must be finished.
    #[error("Complete the video for day {blocking_day} before submitting this session")]
    AccessDenied { blocking_day: DayNumber },

    /// Duplicate daily session submission.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A convenience type alias for `Result<T, ProgramError>`.
pub type ProgramResult<T> = Result<T, ProgramError>;

impl From<PortError> for ProgramError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(id) => ProgramError::NotFound {
                entity: "Resource",
                id,
            },
            PortError::Conflict(msg) => ProgramError::Conflict(msg),
            PortError::Unexpected(msg) => ProgramError::Internal(msg),
        }
    }
}
