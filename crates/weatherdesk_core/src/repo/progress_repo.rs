//! User progress repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `user_progress`.
//! - Enforce the one-way completion transition the schema cannot express.
//! - Validate the text `challenge_id` reference at write time.
//!
//! # Invariants
//! - `challenge_id` is stored as the decimal text of an existing challenge id.
//! - Updates are read-modify-write inside one immediate transaction.
//! - `completed_at` is stamped by SQLite when completion has no explicit time.

use super::challenge_repo::challenge_exists;
use super::common::{
    bool_to_int, ensure_table_ready, parse_bool, push_pagination, RepoError, RepoResult,
};
use crate::model::challenge::ChallengeId;
use crate::model::progress::{CompletedAt, NewProgress, ProgressId, ProgressPatch, UserProgress};
use crate::model::validation::ValidationError;
use log::info;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};

const ENTITY: &str = "user progress";

const PROGRESS_SELECT_SQL: &str = "SELECT
    id,
    challenge_id,
    completed,
    score,
    completed_at
FROM user_progress";

/// Query options for listing progress rows. Results are in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressListQuery {
    pub challenge_id: Option<ChallengeId>,
    pub completed: Option<bool>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for progress CRUD operations.
pub trait ProgressRepository {
    fn create_progress(&self, progress: &NewProgress) -> RepoResult<ProgressId>;
    fn get_progress(&self, id: ProgressId) -> RepoResult<Option<UserProgress>>;
    fn list_progress(&self, query: &ProgressListQuery) -> RepoResult<Vec<UserProgress>>;
    fn update_progress(&self, id: ProgressId, patch: &ProgressPatch) -> RepoResult<()>;
    fn delete_progress(&self, id: ProgressId) -> RepoResult<()>;
}

/// SQLite-backed progress repository.
pub struct SqliteProgressRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProgressRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "user_progress",
            &[
                ("id", "INTEGER"),
                ("challenge_id", "TEXT"),
                ("completed", "BOOLEAN"),
                ("score", "INTEGER"),
                ("completed_at", "INTEGER"),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ProgressRepository for SqliteProgressRepository<'_> {
    fn create_progress(&self, progress: &NewProgress) -> RepoResult<ProgressId> {
        progress.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !challenge_exists(&tx, progress.challenge_id)? {
            return Err(ValidationError::UnknownChallenge {
                challenge_id: progress.challenge_id.to_string(),
            }
            .into());
        }

        tx.execute(
            "INSERT INTO user_progress (
                challenge_id,
                completed,
                score,
                completed_at
            ) VALUES (
                ?1,
                ?2,
                ?3,
                CASE
                    WHEN ?2 = 1 THEN COALESCE(?4, CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
                    ELSE NULL
                END
            );",
            params![
                progress.challenge_id.to_string(),
                bool_to_int(progress.completed),
                progress.score,
                progress.completed_at,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "event=progress_create module=repo status=ok id={} challenge_id={} completed={}",
            id, progress.challenge_id, progress.completed
        );
        Ok(id)
    }

    fn get_progress(&self, id: ProgressId) -> RepoResult<Option<UserProgress>> {
        load_progress(self.conn, id)
    }

    fn list_progress(&self, query: &ProgressListQuery) -> RepoResult<Vec<UserProgress>> {
        let mut sql = format!("{PROGRESS_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(challenge_id) = query.challenge_id {
            sql.push_str(" AND challenge_id = ?");
            bind_values.push(Value::Text(challenge_id.to_string()));
        }
        if let Some(completed) = query.completed {
            sql.push_str(" AND completed = ?");
            bind_values.push(Value::Integer(bool_to_int(completed)));
        }

        sql.push_str(" ORDER BY id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_progress_row(row)?);
        }

        Ok(items)
    }

    fn update_progress(&self, id: ProgressId, patch: &ProgressPatch) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current =
            load_progress(&tx, id)?.ok_or(RepoError::NotFound { entity: ENTITY, id })?;
        if patch.is_empty() {
            return Ok(());
        }

        let resolved = patch.apply_to(&current)?;
        let (explicit_completed_at, stamp_now) = match resolved.completed_at {
            CompletedAt::Unset => (None, false),
            CompletedAt::Keep(value) => (Some(value), false),
            CompletedAt::StampNow => (None, true),
        };

        tx.execute(
            "UPDATE user_progress
             SET
                completed = ?1,
                score = ?2,
                completed_at = CASE
                    WHEN ?4 = 1 THEN CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)
                    ELSE ?3
                END
             WHERE id = ?5;",
            params![
                bool_to_int(resolved.completed),
                resolved.score,
                explicit_completed_at,
                bool_to_int(stamp_now),
                id,
            ],
        )?;
        tx.commit()?;

        info!(
            "event=progress_update module=repo status=ok id={} completed={}",
            id, resolved.completed
        );
        Ok(())
    }

    fn delete_progress(&self, id: ProgressId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM user_progress WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }

        info!("event=progress_delete module=repo status=ok id={}", id);
        Ok(())
    }
}

fn load_progress(conn: &Connection, id: ProgressId) -> RepoResult<Option<UserProgress>> {
    let mut stmt = conn.prepare(&format!("{PROGRESS_SELECT_SQL} WHERE id = ?1;"))?;
    let row = stmt
        .query_row([id], |row| Ok(parse_progress_row(row)))
        .optional()?;
    row.transpose()
}

fn parse_progress_row(row: &Row<'_>) -> RepoResult<UserProgress> {
    let challenge_text: String = row.get("challenge_id")?;
    let challenge_id = challenge_text.trim().parse::<ChallengeId>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid challenge reference `{challenge_text}` in user_progress.challenge_id"
        ))
    })?;
    let completed = parse_bool(row.get("completed")?, "user_progress.completed")?;

    Ok(UserProgress {
        id: row.get("id")?,
        challenge_id,
        completed,
        score: row.get("score")?,
        completed_at: row.get("completed_at")?,
    })
}
