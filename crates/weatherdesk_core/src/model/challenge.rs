//! Weather challenge model.
//!
//! # Responsibility
//! - Describe predefined gamification tasks grouped into tracks.
//! - Own the closed difficulty set and its text representation.
//!
//! # Invariants
//! - `difficulty` is one of `Easy | Medium | Hard`; storage uses the same
//!   capitalized spelling as the CHECK constraint.
//! - Every text field is non-blank and `points >= 0`.

use super::validation::{require_non_negative, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type ChallengeId = i64;

pub const DEFAULT_POINTS: i64 = 100;

/// Closed challenge difficulty set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    /// Parses the exact stored spelling; anything else is a constraint violation.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Easy" => Ok(Self::Easy),
            "Medium" => Ok(Self::Medium),
            "Hard" => Ok(Self::Hard),
            other => Err(ValidationError::InvalidDifficulty {
                value: other.to_string(),
            }),
        }
    }
}

/// Persisted weather challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherChallenge {
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub points: i64,
    pub category: String,
    pub requirements: String,
    pub track: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Caller-supplied fields for a new challenge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default = "default_points")]
    pub points: i64,
    pub category: String,
    pub requirements: String,
    pub track: String,
}

impl NewChallenge {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        require_text("category", &self.category)?;
        require_text("requirements", &self.requirements)?;
        require_text("track", &self.track)?;
        require_non_negative("points", self.points)
    }
}

fn default_points() -> i64 {
    DEFAULT_POINTS
}

/// Partial update for a challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub points: Option<i64>,
    pub category: Option<String>,
    pub requirements: Option<String>,
    pub track: Option<String>,
}

impl ChallengePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let text_fields = [
            ("title", &self.title),
            ("description", &self.description),
            ("category", &self.category),
            ("requirements", &self.requirements),
            ("track", &self.track),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value.as_deref() {
                require_text(field, value)?;
            }
        }
        if let Some(points) = self.points {
            require_non_negative("points", points)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChallengePatch, Difficulty, NewChallenge, DEFAULT_POINTS};
    use crate::model::validation::ValidationError;

    fn sample() -> NewChallenge {
        NewChallenge {
            title: "Storm Chaser".to_string(),
            description: "Find a thunderstorm".to_string(),
            difficulty: Difficulty::Hard,
            points: 250,
            category: "Weather".to_string(),
            requirements: "1 thunderstorm".to_string(),
            track: "Weather Expert".to_string(),
        }
    }

    #[test]
    fn difficulty_parses_exact_spelling_only() {
        assert_eq!("Medium".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert_eq!(
            "Extreme".parse::<Difficulty>(),
            Err(ValidationError::InvalidDifficulty {
                value: "Extreme".to_string()
            })
        );
        assert!("easy".parse::<Difficulty>().is_err());
    }

    #[test]
    fn difficulty_round_trips_through_display() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(difficulty.to_string().parse::<Difficulty>(), Ok(difficulty));
        }
    }

    #[test]
    fn new_challenge_requires_all_text_fields() {
        assert!(sample().validate().is_ok());

        let mut missing_track = sample();
        missing_track.track = String::new();
        assert_eq!(
            missing_track.validate(),
            Err(ValidationError::MissingField { field: "track" })
        );
    }

    #[test]
    fn negative_points_are_rejected() {
        let mut challenge = sample();
        challenge.points = -5;
        assert!(matches!(
            challenge.validate(),
            Err(ValidationError::NegativeValue { field: "points", .. })
        ));
    }

    #[test]
    fn deserializing_without_points_uses_default() {
        let parsed: NewChallenge = serde_json::from_str(
            r#"{
                "title": "t", "description": "d", "difficulty": "Easy",
                "category": "c", "requirements": "r", "track": "k"
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.points, DEFAULT_POINTS);

        let invalid = serde_json::from_str::<NewChallenge>(
            r#"{
                "title": "t", "description": "d", "difficulty": "Extreme",
                "category": "c", "requirements": "r", "track": "k"
            }"#,
        );
        assert!(invalid.is_err());
    }

    #[test]
    fn patch_checks_present_fields() {
        let patch = ChallengePatch {
            category: Some("  ".to_string()),
            ..ChallengePatch::default()
        };
        assert_eq!(
            patch.validate(),
            Err(ValidationError::MissingField { field: "category" })
        );
        assert!(ChallengePatch::default().is_empty());
    }
}
