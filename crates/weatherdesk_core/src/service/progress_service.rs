//! User progress use-case service.
//!
//! # Responsibility
//! - Start, record and complete challenge attempts.
//! - Keep one progress row per challenge on the `record_progress` path.
//!
//! # Invariants
//! - Completion stays one-way; `record_progress` never reopens a row.
//! - Returned records are read back from storage after every write.

use crate::model::challenge::ChallengeId;
use crate::model::progress::{NewProgress, ProgressId, ProgressPatch, UserProgress};
use crate::repo::progress_repo::{ProgressListQuery, ProgressRepository};
use crate::repo::{RepoError, RepoResult};

/// Use-case service wrapper for progress operations.
pub struct ProgressService<R: ProgressRepository> {
    repo: R,
}

impl<R: ProgressRepository> ProgressService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a pending progress row for `challenge_id`.
    pub fn start_challenge(&self, challenge_id: ChallengeId) -> RepoResult<UserProgress> {
        let id = self.repo.create_progress(&NewProgress::pending(challenge_id))?;
        self.require_progress(id)
    }

    /// Records a result against a challenge.
    ///
    /// # Contract
    /// - Updates the newest progress row of `challenge_id`, or creates one.
    /// - `completed = true` completes the row, stamping `completed_at`.
    /// - `completed = false` only updates the score; it never reopens a
    ///   completed row.
    pub fn record_progress(
        &self,
        challenge_id: ChallengeId,
        completed: bool,
        score: i64,
    ) -> RepoResult<UserProgress> {
        let existing = self
            .repo
            .list_progress(&ProgressListQuery {
                challenge_id: Some(challenge_id),
                ..ProgressListQuery::default()
            })?
            .pop();

        let id = match existing {
            Some(progress) => {
                let patch = ProgressPatch {
                    completed: completed.then_some(true),
                    score: Some(score),
                    completed_at: None,
                };
                self.repo.update_progress(progress.id, &patch)?;
                progress.id
            }
            None => self.repo.create_progress(&NewProgress {
                challenge_id,
                completed,
                score,
                completed_at: None,
            })?,
        };

        self.require_progress(id)
    }

    /// Marks a progress row completed with `score`.
    pub fn complete(&self, id: ProgressId, score: i64) -> RepoResult<UserProgress> {
        let patch = ProgressPatch::complete(score);
        self.repo.update_progress(id, &patch)?;
        self.require_progress(id)
    }

    pub fn get_progress(&self, id: ProgressId) -> RepoResult<Option<UserProgress>> {
        self.repo.get_progress(id)
    }

    pub fn list_progress(&self, query: &ProgressListQuery) -> RepoResult<Vec<UserProgress>> {
        self.repo.list_progress(query)
    }

    pub fn update_progress(
        &self,
        id: ProgressId,
        patch: &ProgressPatch,
    ) -> RepoResult<UserProgress> {
        self.repo.update_progress(id, patch)?;
        self.require_progress(id)
    }

    pub fn delete_progress(&self, id: ProgressId) -> RepoResult<()> {
        self.repo.delete_progress(id)
    }

    fn require_progress(&self, id: ProgressId) -> RepoResult<UserProgress> {
        let missing = || RepoError::InvalidData(format!("user progress {id} missing after write"));
        self.repo.get_progress(id)?.ok_or_else(missing)
    }
}
