//! User progress model.
//!
//! # Responsibility
//! - Track attempts and completions of weather challenges.
//! - Define the one-way Pending -> Completed transition.
//!
//! # Invariants
//! - `completed_at` is `None` while `completed == false`.
//! - A completed row never returns to pending and keeps its `completed_at`.
//! - `score >= 0`.

use super::challenge::ChallengeId;
use super::validation::{require_non_negative, ValidationError};
use serde::Serialize;

pub type ProgressId = i64;

/// Lifecycle state derived from the `completed` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Pending,
    Completed,
}

/// Persisted progress record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProgress {
    pub id: ProgressId,
    pub challenge_id: ChallengeId,
    pub completed: bool,
    pub score: i64,
    /// Unix epoch milliseconds; set only once completed.
    pub completed_at: Option<i64>,
}

impl UserProgress {
    pub fn status(&self) -> ProgressStatus {
        if self.completed {
            ProgressStatus::Completed
        } else {
            ProgressStatus::Pending
        }
    }
}

/// Caller-supplied fields for a new progress row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgress {
    pub challenge_id: ChallengeId,
    pub completed: bool,
    pub score: i64,
    /// Ignored unless `completed`; defaults to "now" when completed.
    pub completed_at: Option<i64>,
}

impl NewProgress {
    /// Pending progress with zero score.
    pub fn pending(challenge_id: ChallengeId) -> Self {
        Self {
            challenge_id,
            completed: false,
            score: 0,
            completed_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_negative("score", self.score)?;
        if !self.completed && self.completed_at.is_some() {
            return Err(ValidationError::CompletedAtWithoutCompletion);
        }
        Ok(())
    }
}

/// Partial update for a progress row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressPatch {
    pub completed: Option<bool>,
    pub score: Option<i64>,
    pub completed_at: Option<i64>,
}

impl ProgressPatch {
    /// Patch that completes the row with `score`, stamped "now".
    pub fn complete(score: i64) -> Self {
        Self {
            completed: Some(true),
            score: Some(score),
            completed_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Resolves this patch against the stored row.
    ///
    /// Fails when the patch would reopen a completed row or rewrite its
    /// completion time.
    pub fn apply_to(&self, current: &UserProgress) -> Result<ResolvedProgress, ValidationError> {
        if let Some(score) = self.score {
            require_non_negative("score", score)?;
        }

        let completed = self.completed.unwrap_or(current.completed);
        if current.completed && !completed {
            return Err(ValidationError::CompletionRevoked {
                progress_id: current.id,
            });
        }

        let completed_at = match (current.completed_at, self.completed_at, completed) {
            (Some(existing), Some(requested), _) if existing != requested => {
                return Err(ValidationError::CompletedAtImmutable {
                    progress_id: current.id,
                });
            }
            (Some(existing), _, _) => CompletedAt::Keep(existing),
            (None, Some(_), false) => return Err(ValidationError::CompletedAtWithoutCompletion),
            (None, Some(requested), true) => CompletedAt::Keep(requested),
            (None, None, true) => CompletedAt::StampNow,
            (None, None, false) => CompletedAt::Unset,
        };

        Ok(ResolvedProgress {
            completed,
            score: self.score.unwrap_or(current.score),
            completed_at,
        })
    }
}

/// Completion time decision for a resolved write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedAt {
    Unset,
    Keep(i64),
    StampNow,
}

/// Fully resolved row state produced by [`ProgressPatch::apply_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedProgress {
    pub completed: bool,
    pub score: i64,
    pub completed_at: CompletedAt,
}
