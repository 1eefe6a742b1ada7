//! Core records store for the weather desk application.
//! This crate is the single source of truth for storage invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::StoreConfig;
pub use db::{open_db, open_db_in_memory, reset_schema, DbError, StoreContext};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::challenge::{
    ChallengeId, ChallengePatch, Difficulty, NewChallenge, WeatherChallenge, DEFAULT_POINTS,
};
pub use model::location::{LocationId, LocationPatch, NewLocation, SavedLocation};
pub use model::progress::{NewProgress, ProgressId, ProgressPatch, ProgressStatus, UserProgress};
pub use model::validation::ValidationError;
pub use repo::challenge_repo::{
    ChallengeListQuery, ChallengeOrder, ChallengeRepository, SqliteChallengeRepository,
};
pub use repo::location_repo::{
    LocationListQuery, LocationOrder, LocationRepository, SqliteLocationRepository,
};
pub use repo::progress_repo::{ProgressListQuery, ProgressRepository, SqliteProgressRepository};
pub use repo::{ErrorKind, RepoError, RepoResult};
pub use service::challenge_service::{
    default_challenges, ChallengeCard, ChallengeService, ChallengeTrack,
};
pub use service::location_service::LocationService;
pub use service::progress_service::ProgressService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
