//! Weather challenge use-case service.
//!
//! # Responsibility
//! - Administer challenges and seed the built-in set.
//! - Build the challenge board: challenges grouped by track, merged with
//!   the user's progress.
//!
//! # Invariants
//! - Seeding only writes into an empty challenge table.
//! - Board tracks are ordered by name; challenges inside a track by points.

use crate::model::challenge::{
    ChallengeId, ChallengePatch, Difficulty, NewChallenge, WeatherChallenge,
};
use crate::model::progress::UserProgress;
use crate::repo::challenge_repo::{ChallengeListQuery, ChallengeOrder, ChallengeRepository};
use crate::repo::progress_repo::{ProgressListQuery, ProgressRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use serde::Serialize;
use std::collections::HashMap;

/// One challenge on the board with the user's standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeCard {
    #[serde(flatten)]
    pub challenge: WeatherChallenge,
    pub completed: bool,
    pub score: i64,
}

/// Challenges sharing one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeTrack {
    pub track: String,
    pub challenges: Vec<ChallengeCard>,
}

/// Use-case service for challenge administration and the challenge board.
pub struct ChallengeService<C: ChallengeRepository, P: ProgressRepository> {
    challenges: C,
    progress: P,
}

impl<C: ChallengeRepository, P: ProgressRepository> ChallengeService<C, P> {
    pub fn new(challenges: C, progress: P) -> Self {
        Self {
            challenges,
            progress,
        }
    }

    pub fn create_challenge(&self, challenge: &NewChallenge) -> RepoResult<WeatherChallenge> {
        let id = self.challenges.create_challenge(challenge)?;
        self.require_challenge(id)
    }

    pub fn get_challenge(&self, id: ChallengeId) -> RepoResult<Option<WeatherChallenge>> {
        self.challenges.get_challenge(id)
    }

    pub fn list_challenges(&self, query: &ChallengeListQuery) -> RepoResult<Vec<WeatherChallenge>> {
        self.challenges.list_challenges(query)
    }

    pub fn update_challenge(
        &self,
        id: ChallengeId,
        patch: &ChallengePatch,
    ) -> RepoResult<WeatherChallenge> {
        self.challenges.update_challenge(id, patch)?;
        self.require_challenge(id)
    }

    /// Deletes a challenge. Progress rows that reference it are kept.
    pub fn delete_challenge(&self, id: ChallengeId) -> RepoResult<()> {
        self.challenges.delete_challenge(id)
    }

    /// Inserts the built-in challenges when no challenge exists yet.
    ///
    /// Returns the number of inserted rows (`0` when already seeded).
    /// A failed insert leaves the table empty, so a retry seeds the full set.
    pub fn seed_default_challenges(&self) -> RepoResult<usize> {
        let inserted = self.challenges.seed_challenges(&default_challenges())?;
        if inserted == 0 {
            info!("event=challenge_seed module=service status=skipped reason=not_empty");
        }
        Ok(inserted)
    }

    /// Groups every challenge by track and attaches progress.
    ///
    /// A challenge without progress shows `completed = false, score = 0`.
    /// With several progress rows, a completed row wins over pending ones and
    /// the newest row wins among equals.
    pub fn challenge_board(&self) -> RepoResult<Vec<ChallengeTrack>> {
        let challenges = self.challenges.list_challenges(&ChallengeListQuery {
            order: ChallengeOrder::TrackThenPoints,
            ..ChallengeListQuery::default()
        })?;
        let standings = best_progress_by_challenge(
            self.progress
                .list_progress(&ProgressListQuery::default())?,
        );

        let mut tracks: Vec<ChallengeTrack> = Vec::new();
        for challenge in challenges {
            let (completed, score) = standings
                .get(&challenge.id)
                .map_or((false, 0), |progress| (progress.completed, progress.score));
            let card = ChallengeCard {
                challenge,
                completed,
                score,
            };

            match tracks.last_mut() {
                Some(track) if track.track == card.challenge.track => track.challenges.push(card),
                _ => tracks.push(ChallengeTrack {
                    track: card.challenge.track.clone(),
                    challenges: vec![card],
                }),
            }
        }

        Ok(tracks)
    }

    fn require_challenge(&self, id: ChallengeId) -> RepoResult<WeatherChallenge> {
        self.challenges.get_challenge(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("weather challenge {id} missing after write"))
        })
    }
}

/// Built-in challenge set used by `seed_default_challenges`.
pub fn default_challenges() -> Vec<NewChallenge> {
    let challenge = |title: &str,
                     description: &str,
                     difficulty: Difficulty,
                     category: &str,
                     points: i64,
                     requirements: &str,
                     track: &str| NewChallenge {
        title: title.to_string(),
        description: description.to_string(),
        difficulty,
        points,
        category: category.to_string(),
        requirements: requirements.to_string(),
        track: track.to_string(),
    };

    vec![
        challenge(
            "Weather Novice",
            "Get started with basic weather tracking",
            Difficulty::Easy,
            "Basics",
            100,
            "Complete first weather search",
            "Getting Started",
        ),
        challenge(
            "City Explorer",
            "Search weather in 3 different cities",
            Difficulty::Easy,
            "Search",
            200,
            "3 unique cities",
            "Getting Started",
        ),
        challenge(
            "Weather Patterns",
            "Find cities with 3 different weather conditions",
            Difficulty::Medium,
            "Weather",
            300,
            "3 unique conditions",
            "Weather Expert",
        ),
        challenge(
            "Global Navigator",
            "Check weather in 3 different continents",
            Difficulty::Medium,
            "Geography",
            400,
            "3 continents",
            "Weather Expert",
        ),
        challenge(
            "Weather Master",
            "Complete all challenges in the Weather Expert track",
            Difficulty::Hard,
            "Achievement",
            500,
            "All previous challenges",
            "Weather Expert",
        ),
    ]
}

fn best_progress_by_challenge(rows: Vec<UserProgress>) -> HashMap<ChallengeId, UserProgress> {
    let mut best: HashMap<ChallengeId, UserProgress> = HashMap::new();
    // Rows arrive in insertion order, so a later row replaces an earlier
    // one unless that would hide a completion.
    for row in rows {
        match best.get(&row.challenge_id) {
            Some(existing) if existing.completed && !row.completed => {}
            _ => {
                best.insert(row.challenge_id, row);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{best_progress_by_challenge, default_challenges};
    use crate::model::challenge::Difficulty;
    use crate::model::progress::UserProgress;

    fn row(id: i64, challenge_id: i64, completed: bool, score: i64) -> UserProgress {
        UserProgress {
            id,
            challenge_id,
            completed,
            score,
            completed_at: completed.then_some(1),
        }
    }

    #[test]
    fn defaults_are_valid_and_cover_every_difficulty() {
        let defaults = default_challenges();
        assert_eq!(defaults.len(), 5);
        assert!(defaults.iter().all(|challenge| challenge.validate().is_ok()));
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert!(defaults.iter().any(|c| c.difficulty == difficulty));
        }
    }

    #[test]
    fn completed_progress_is_not_hidden_by_later_pending_row() {
        let best = best_progress_by_challenge(vec![
            row(1, 10, true, 80),
            row(2, 10, false, 5),
            row(3, 11, false, 1),
            row(4, 11, false, 2),
        ]);
        assert_eq!(best[&10].id, 1);
        assert_eq!(best[&11].id, 4);
    }
}
