//! Weather challenge repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `weather_challenges`.
//! - Map the stored difficulty text to the closed `Difficulty` set.
//!
//! # Invariants
//! - Writes call `NewChallenge::validate()` / `ChallengePatch::validate()` first.
//! - Reads reject difficulty text outside the CHECK set instead of masking it.
//! - Seeding writes the whole set or nothing.

use super::common::{ensure_table_ready, push_pagination, RepoError, RepoResult};
use crate::model::challenge::{
    ChallengeId, ChallengePatch, Difficulty, NewChallenge, WeatherChallenge,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const ENTITY: &str = "weather challenge";

const CHALLENGE_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    difficulty,
    points,
    category,
    requirements,
    track,
    created_at
FROM weather_challenges";

/// Result ordering for challenge lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChallengeOrder {
    /// `id ASC`.
    #[default]
    Insertion,
    /// `track ASC, points ASC, id ASC` (challenge board layout).
    TrackThenPoints,
}

/// Query options for listing challenges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeListQuery {
    pub track: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub order: ChallengeOrder,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for challenge CRUD operations.
pub trait ChallengeRepository {
    fn create_challenge(&self, challenge: &NewChallenge) -> RepoResult<ChallengeId>;
    fn get_challenge(&self, id: ChallengeId) -> RepoResult<Option<WeatherChallenge>>;
    fn list_challenges(&self, query: &ChallengeListQuery) -> RepoResult<Vec<WeatherChallenge>>;
    fn update_challenge(&self, id: ChallengeId, patch: &ChallengePatch) -> RepoResult<()>;
    fn delete_challenge(&self, id: ChallengeId) -> RepoResult<()>;
    fn count_challenges(&self) -> RepoResult<u64>;
    /// Inserts `challenges` when the table is empty; returns the inserted count.
    fn seed_challenges(&self, challenges: &[NewChallenge]) -> RepoResult<usize>;
}

/// SQLite-backed challenge repository.
pub struct SqliteChallengeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChallengeRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "weather_challenges",
            &[
                ("id", "INTEGER"),
                ("title", "TEXT"),
                ("description", "TEXT"),
                ("difficulty", "TEXT"),
                ("points", "INTEGER"),
                ("category", "TEXT"),
                ("requirements", "TEXT"),
                ("track", "TEXT"),
                ("created_at", "INTEGER"),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ChallengeRepository for SqliteChallengeRepository<'_> {
    fn create_challenge(&self, challenge: &NewChallenge) -> RepoResult<ChallengeId> {
        challenge.validate()?;
        let id = insert_challenge(self.conn, challenge)?;

        info!(
            "event=challenge_create module=repo status=ok id={} difficulty={}",
            id, challenge.difficulty
        );
        Ok(id)
    }

    fn get_challenge(&self, id: ChallengeId) -> RepoResult<Option<WeatherChallenge>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHALLENGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_challenge_row(row)?));
        }

        Ok(None)
    }

    fn list_challenges(&self, query: &ChallengeListQuery) -> RepoResult<Vec<WeatherChallenge>> {
        let mut sql = format!("{CHALLENGE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(track) = query.track.as_ref() {
            sql.push_str(" AND track = ?");
            bind_values.push(Value::Text(track.clone()));
        }
        if let Some(difficulty) = query.difficulty {
            sql.push_str(" AND difficulty = ?");
            bind_values.push(Value::Text(difficulty.as_str().to_string()));
        }

        match query.order {
            ChallengeOrder::Insertion => sql.push_str(" ORDER BY id ASC"),
            ChallengeOrder::TrackThenPoints => {
                sql.push_str(" ORDER BY track ASC, points ASC, id ASC")
            }
        }
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut challenges = Vec::new();
        while let Some(row) = rows.next()? {
            challenges.push(parse_challenge_row(row)?);
        }

        Ok(challenges)
    }

    fn update_challenge(&self, id: ChallengeId, patch: &ChallengePatch) -> RepoResult<()> {
        patch.validate()?;

        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        let text_columns = [
            ("title = ?", &patch.title),
            ("description = ?", &patch.description),
            ("category = ?", &patch.category),
            ("requirements = ?", &patch.requirements),
            ("track = ?", &patch.track),
        ];
        for (assignment, value) in text_columns {
            if let Some(value) = value {
                assignments.push(assignment);
                bind_values.push(Value::Text(value.clone()));
            }
        }
        if let Some(difficulty) = patch.difficulty {
            assignments.push("difficulty = ?");
            bind_values.push(Value::Text(difficulty.as_str().to_string()));
        }
        if let Some(points) = patch.points {
            assignments.push("points = ?");
            bind_values.push(Value::Integer(points));
        }

        if assignments.is_empty() {
            return if challenge_exists(self.conn, id)? {
                Ok(())
            } else {
                Err(RepoError::NotFound { entity: ENTITY, id })
            };
        }

        bind_values.push(Value::Integer(id));
        let changed = self.conn.execute(
            &format!(
                "UPDATE weather_challenges SET {} WHERE id = ?;",
                assignments.join(", ")
            ),
            params_from_iter(bind_values),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }

        info!("event=challenge_update module=repo status=ok id={}", id);
        Ok(())
    }

    fn delete_challenge(&self, id: ChallengeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM weather_challenges WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }

        info!("event=challenge_delete module=repo status=ok id={}", id);
        Ok(())
    }

    fn count_challenges(&self) -> RepoResult<u64> {
        count_rows(self.conn)
    }

    fn seed_challenges(&self, challenges: &[NewChallenge]) -> RepoResult<usize> {
        for challenge in challenges {
            challenge.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if count_rows(&tx)? > 0 {
            return Ok(0);
        }
        for challenge in challenges {
            insert_challenge(&tx, challenge)?;
        }
        tx.commit()?;

        info!(
            "event=challenge_seed module=repo status=ok inserted={}",
            challenges.len()
        );
        Ok(challenges.len())
    }
}

fn insert_challenge(conn: &Connection, challenge: &NewChallenge) -> RepoResult<ChallengeId> {
    conn.execute(
        "INSERT INTO weather_challenges (
            title,
            description,
            difficulty,
            points,
            category,
            requirements,
            track
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            challenge.title.as_str(),
            challenge.description.as_str(),
            challenge.difficulty.as_str(),
            challenge.points,
            challenge.category.as_str(),
            challenge.requirements.as_str(),
            challenge.track.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn count_rows(conn: &Connection) -> RepoResult<u64> {
    let sql = "SELECT COUNT(*) FROM weather_challenges;";
    let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    u64::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative challenge count `{count}`")))
}

/// Returns whether a challenge with `id` exists.
pub(crate) fn challenge_exists(conn: &Connection, id: ChallengeId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM weather_challenges WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_challenge_row(row: &Row<'_>) -> RepoResult<WeatherChallenge> {
    let difficulty_text: String = row.get("difficulty")?;
    let difficulty = difficulty_text.parse::<Difficulty>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid difficulty `{difficulty_text}` in weather_challenges.difficulty"
        ))
    })?;

    Ok(WeatherChallenge {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        difficulty,
        points: row.get("points")?,
        category: row.get("category")?,
        requirements: row.get("requirements")?,
        track: row.get("track")?,
        created_at: row.get("created_at")?,
    })
}
