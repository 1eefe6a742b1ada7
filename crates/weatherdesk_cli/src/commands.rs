//! Subcommand definitions and their execution against a store session.
//!
//! Every command opens exactly one scoped session through
//! `StoreContext::with_session`, except `init` which rebuilds the schema first.

use crate::envelope::{CliError, Outcome};
use clap::{Args, Subcommand};
use log::info;
use weatherdesk_core::{
    ChallengeListQuery, ChallengePatch, ChallengeService, Difficulty, LocationListQuery,
    LocationOrder, LocationPatch, LocationService, NewChallenge, NewLocation, ProgressListQuery,
    ProgressPatch, ProgressService, RepoError, SqliteChallengeRepository, SqliteLocationRepository,
    SqliteProgressRepository, StoreContext, DEFAULT_POINTS,
};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recreate an empty store (deletes every row)
    Init {
        /// Skip inserting the built-in challenges
        #[arg(long)]
        no_seed: bool,
    },
    /// Saved locations
    #[command(subcommand)]
    Location(LocationCommand),
    /// Weather challenges
    #[command(subcommand)]
    Challenge(ChallengeCommand),
    /// Challenge progress
    #[command(subcommand)]
    Progress(ProgressCommand),
}

#[derive(Subcommand, Debug)]
pub enum LocationCommand {
    /// Save a location
    #[command(allow_negative_numbers = true)]
    Add {
        name: String,
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        state: Option<String>,
        /// Mark as the current location
        #[arg(long)]
        current: bool,
    },
    /// List saved locations, current first
    List {
        /// Only the current location
        #[arg(long)]
        current_only: bool,
        /// Keep insertion order instead of current-first
        #[arg(long)]
        insertion_order: bool,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show the current location
    Current,
    /// Patch a saved location
    #[command(allow_negative_numbers = true)]
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        lat: Option<f64>,
        #[arg(long)]
        lon: Option<f64>,
        #[arg(long, conflicts_with = "clear_country")]
        country: Option<String>,
        #[arg(long)]
        clear_country: bool,
        #[arg(long, conflicts_with = "clear_state")]
        state: Option<String>,
        #[arg(long)]
        clear_state: bool,
        #[arg(long)]
        current: Option<bool>,
    },
    /// Delete a saved location
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ChallengeCommand {
    /// Create a challenge
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Easy, Medium or Hard
        #[arg(long)]
        difficulty: String,
        #[arg(long, default_value_t = DEFAULT_POINTS)]
        points: i64,
        #[arg(long)]
        category: String,
        #[arg(long)]
        requirements: String,
        #[arg(long)]
        track: String,
    },
    /// List challenges
    List {
        #[arg(long)]
        track: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Challenges grouped by track with progress
    Board,
    /// Patch a challenge
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        points: Option<i64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        requirements: Option<String>,
        #[arg(long)]
        track: Option<String>,
    },
    /// Delete a challenge; its progress rows are kept
    Delete { id: i64 },
    /// Insert the built-in challenges into an empty table
    Seed,
}

#[derive(Subcommand, Debug)]
pub enum ProgressCommand {
    /// Start a challenge attempt
    Start { challenge_id: i64 },
    /// Record a score for a challenge, creating progress when needed
    Record {
        challenge_id: i64,
        #[arg(long, default_value_t = 0)]
        score: i64,
        #[arg(long)]
        completed: bool,
    },
    /// Complete a progress row
    Complete {
        id: i64,
        #[arg(long, default_value_t = 0)]
        score: i64,
    },
    /// List progress rows
    List {
        #[arg(long)]
        challenge_id: Option<i64>,
        #[arg(long)]
        completed: Option<bool>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Patch a progress row
    Update {
        id: i64,
        #[arg(long)]
        completed: Option<bool>,
        #[arg(long)]
        score: Option<i64>,
        /// Unix epoch milliseconds
        #[arg(long)]
        completed_at: Option<i64>,
    },
    /// Delete a progress row
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PageArgs {
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Location(_) => "location",
            Self::Challenge(_) => "challenge",
            Self::Progress(_) => "progress",
        }
    }

    pub fn execute(self, context: &StoreContext) -> Result<Outcome, CliError> {
        let name = self.name();
        let outcome = match self {
            Self::Init { no_seed } => run_init(context, no_seed),
            Self::Location(command) => command.execute(context),
            Self::Challenge(command) => command.execute(context),
            Self::Progress(command) => command.execute(context),
        }?;
        info!("event=cli_command module=cli status=ok command={}", name);
        Ok(outcome)
    }
}

fn run_init(context: &StoreContext, no_seed: bool) -> Result<Outcome, CliError> {
    context.initialize()?;
    let seeded = if no_seed {
        0
    } else {
        context.with_session(|conn| {
            ChallengeService::new(
                SqliteChallengeRepository::try_new(conn)?,
                SqliteProgressRepository::try_new(conn)?,
            )
            .seed_default_challenges()
        })?
    };

    let outcome = Outcome::data(&serde_json::json!({ "seeded": seeded }))?;
    Ok(outcome.with_message("Store initialized"))
}

impl LocationCommand {
    fn execute(self, context: &StoreContext) -> Result<Outcome, CliError> {
        match self {
            Self::Add {
                name,
                lat,
                lon,
                country,
                state,
                current,
            } => {
                let location = NewLocation {
                    name,
                    lat,
                    lon,
                    country,
                    state,
                    is_current: current,
                };
                let saved = with_locations(context, |service| service.save_location(&location))?;
                Ok(Outcome::data(&saved)?.with_message("Location saved successfully"))
            }
            Self::List {
                current_only,
                insertion_order,
                page,
            } => {
                let query = LocationListQuery {
                    current_only,
                    order: if insertion_order {
                        LocationOrder::Insertion
                    } else {
                        LocationOrder::CurrentFirst
                    },
                    limit: page.limit,
                    offset: page.offset,
                };
                let locations = with_locations(context, |service| service.list_locations(&query))?;
                Outcome::data(&locations)
            }
            Self::Current => {
                let current = with_locations(context, |service| service.current_location())?;
                Outcome::data(&current)
            }
            Self::Update {
                id,
                name,
                lat,
                lon,
                country,
                clear_country,
                state,
                clear_state,
                current,
            } => {
                let patch = LocationPatch {
                    name,
                    lat,
                    lon,
                    country: nullable(country, clear_country),
                    state: nullable(state, clear_state),
                    is_current: current,
                };
                if patch.is_empty() {
                    return Err(CliError::Usage("no location fields to update".to_string()));
                }
                let updated =
                    with_locations(context, |service| service.update_location(id, &patch))?;
                Ok(Outcome::data(&updated)?.with_message("Location updated successfully"))
            }
            Self::Delete { id } => {
                with_locations(context, |service| service.delete_location(id))?;
                Ok(Outcome::message("Location deleted successfully"))
            }
        }
    }
}

impl ChallengeCommand {
    fn execute(self, context: &StoreContext) -> Result<Outcome, CliError> {
        match self {
            Self::Add {
                title,
                description,
                difficulty,
                points,
                category,
                requirements,
                track,
            } => {
                let challenge = NewChallenge {
                    title,
                    description,
                    difficulty: parse_difficulty(&difficulty)?,
                    points,
                    category,
                    requirements,
                    track,
                };
                let created =
                    with_challenges(context, |service| service.create_challenge(&challenge))?;
                Ok(Outcome::data(&created)?.with_message("Challenge created"))
            }
            Self::List {
                track,
                difficulty,
                page,
            } => {
                let query = ChallengeListQuery {
                    track,
                    difficulty: difficulty.as_deref().map(parse_difficulty).transpose()?,
                    limit: page.limit,
                    offset: page.offset,
                    ..ChallengeListQuery::default()
                };
                let challenges =
                    with_challenges(context, |service| service.list_challenges(&query))?;
                Outcome::data(&challenges)
            }
            Self::Board => {
                let board = with_challenges(context, |service| service.challenge_board())?;
                Outcome::data(&board)
            }
            Self::Update {
                id,
                title,
                description,
                difficulty,
                points,
                category,
                requirements,
                track,
            } => {
                let patch = ChallengePatch {
                    title,
                    description,
                    difficulty: difficulty.as_deref().map(parse_difficulty).transpose()?,
                    points,
                    category,
                    requirements,
                    track,
                };
                if patch.is_empty() {
                    return Err(CliError::Usage("no challenge fields to update".to_string()));
                }
                let updated =
                    with_challenges(context, |service| service.update_challenge(id, &patch))?;
                Ok(Outcome::data(&updated)?.with_message("Challenge updated"))
            }
            Self::Delete { id } => {
                with_challenges(context, |service| service.delete_challenge(id))?;
                Ok(Outcome::message("Challenge deleted"))
            }
            Self::Seed => {
                let inserted =
                    with_challenges(context, |service| service.seed_default_challenges())?;
                Outcome::data(&serde_json::json!({ "inserted": inserted }))
            }
        }
    }
}

impl ProgressCommand {
    fn execute(self, context: &StoreContext) -> Result<Outcome, CliError> {
        match self {
            Self::Start { challenge_id } => {
                let progress =
                    with_progress(context, |service| service.start_challenge(challenge_id))?;
                Ok(Outcome::data(&progress)?.with_message("Challenge started"))
            }
            Self::Record {
                challenge_id,
                score,
                completed,
            } => {
                let progress = with_progress(context, |service| {
                    service.record_progress(challenge_id, completed, score)
                })?;
                Ok(Outcome::data(&progress)?.with_message("Progress updated"))
            }
            Self::Complete { id, score } => {
                let progress = with_progress(context, |service| service.complete(id, score))?;
                Ok(Outcome::data(&progress)?.with_message("Challenge completed"))
            }
            Self::List {
                challenge_id,
                completed,
                page,
            } => {
                let query = ProgressListQuery {
                    challenge_id,
                    completed,
                    limit: page.limit,
                    offset: page.offset,
                };
                let rows = with_progress(context, |service| service.list_progress(&query))?;
                Outcome::data(&rows)
            }
            Self::Update {
                id,
                completed,
                score,
                completed_at,
            } => {
                let patch = ProgressPatch {
                    completed,
                    score,
                    completed_at,
                };
                if patch.is_empty() {
                    return Err(CliError::Usage("no progress fields to update".to_string()));
                }
                let progress =
                    with_progress(context, |service| service.update_progress(id, &patch))?;
                Ok(Outcome::data(&progress)?.with_message("Progress updated"))
            }
            Self::Delete { id } => {
                with_progress(context, |service| service.delete_progress(id))?;
                Ok(Outcome::message("Progress deleted"))
            }
        }
    }
}

fn with_locations<T>(
    context: &StoreContext,
    f: impl FnOnce(&LocationService<SqliteLocationRepository<'_>>) -> Result<T, RepoError>,
) -> Result<T, CliError> {
    let value = context.with_session(|conn| {
        let service = LocationService::new(SqliteLocationRepository::try_new(conn)?);
        f(&service)
    })?;
    Ok(value)
}

fn with_challenges<T>(
    context: &StoreContext,
    f: impl FnOnce(
        &ChallengeService<SqliteChallengeRepository<'_>, SqliteProgressRepository<'_>>,
    ) -> Result<T, RepoError>,
) -> Result<T, CliError> {
    let value = context.with_session(|conn| {
        let service = ChallengeService::new(
            SqliteChallengeRepository::try_new(conn)?,
            SqliteProgressRepository::try_new(conn)?,
        );
        f(&service)
    })?;
    Ok(value)
}

fn with_progress<T>(
    context: &StoreContext,
    f: impl FnOnce(&ProgressService<SqliteProgressRepository<'_>>) -> Result<T, RepoError>,
) -> Result<T, CliError> {
    let value = context.with_session(|conn| {
        let service = ProgressService::new(SqliteProgressRepository::try_new(conn)?);
        f(&service)
    })?;
    Ok(value)
}

fn parse_difficulty(value: &str) -> Result<Difficulty, CliError> {
    value
        .parse::<Difficulty>()
        .map_err(|err| CliError::Repo(RepoError::from(err)))
}

fn nullable(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}
