//! Constraint violations shared by all record types.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A write was rejected because it would break a schema or access-layer rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationError {
    /// Required text field is empty or whitespace only.
    MissingField { field: &'static str },
    /// Coordinate is not finite or out of its degree range.
    InvalidCoordinate { field: &'static str, value: f64 },
    /// Difficulty outside `Easy | Medium | Hard`.
    InvalidDifficulty { value: String },
    /// Numeric field must not be negative.
    NegativeValue { field: &'static str, value: i64 },
    /// Progress references a challenge id that does not exist.
    UnknownChallenge { challenge_id: String },
    /// Completed progress cannot return to pending.
    CompletionRevoked { progress_id: i64 },
    /// `completed_at` given while the row stays pending.
    CompletedAtWithoutCompletion,
    /// `completed_at` of a completed row cannot be rewritten.
    CompletedAtImmutable { progress_id: i64 },
    /// Storage engine rejected the write (NOT NULL, CHECK, ...).
    Storage { message: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing required field `{field}`"),
            Self::InvalidCoordinate { field, value } => {
                write!(f, "invalid coordinate `{field}`: {value}")
            }
            Self::InvalidDifficulty { value } => write!(
                f,
                "invalid difficulty `{value}`; expected Easy|Medium|Hard"
            ),
            Self::NegativeValue { field, value } => {
                write!(f, "`{field}` must not be negative, got {value}")
            }
            Self::UnknownChallenge { challenge_id } => {
                write!(f, "challenge `{challenge_id}` does not exist")
            }
            Self::CompletionRevoked { progress_id } => {
                write!(f, "progress {progress_id} is completed and cannot be reopened")
            }
            Self::CompletedAtWithoutCompletion => {
                write!(f, "`completed_at` requires `completed = true`")
            }
            Self::CompletedAtImmutable { progress_id } => {
                write!(f, "progress {progress_id} already has a completion time")
            }
            Self::Storage { message } => write!(f, "constraint failed: {message}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeValue { field, value });
    }
    Ok(())
}
