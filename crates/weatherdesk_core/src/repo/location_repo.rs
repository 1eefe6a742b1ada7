//! Saved location repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `saved_locations`.
//! - Keep the single-current-location policy inside one transaction.
//!
//! # Invariants
//! - Writes call `NewLocation::validate()` / `LocationPatch::validate()` first.
//! - Marking a row current clears `is_current` on every other row.
//! - Delete of a missing id is `NotFound`, never a silent success.

use super::common::{
    bool_to_int, ensure_table_ready, parse_bool, push_pagination, RepoError, RepoResult,
};
use crate::model::location::{LocationId, LocationPatch, NewLocation, SavedLocation};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const ENTITY: &str = "saved location";

const LOCATION_SELECT_SQL: &str = "SELECT
    id,
    name,
    lat,
    lon,
    country,
    state,
    is_current,
    created_at
FROM saved_locations";

/// Result ordering for location lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocationOrder {
    /// `id ASC`.
    #[default]
    Insertion,
    /// Current location first, then newest first (favorites dropdown).
    CurrentFirst,
}

/// Query options for listing saved locations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationListQuery {
    pub current_only: bool,
    pub order: LocationOrder,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for saved location CRUD operations.
pub trait LocationRepository {
    fn create_location(&self, location: &NewLocation) -> RepoResult<LocationId>;
    fn get_location(&self, id: LocationId) -> RepoResult<Option<SavedLocation>>;
    fn list_locations(&self, query: &LocationListQuery) -> RepoResult<Vec<SavedLocation>>;
    fn update_location(&self, id: LocationId, patch: &LocationPatch) -> RepoResult<()>;
    fn delete_location(&self, id: LocationId) -> RepoResult<()>;
}

/// SQLite-backed saved location repository.
pub struct SqliteLocationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLocationRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "saved_locations",
            &[
                ("id", "INTEGER"),
                ("name", "TEXT"),
                ("lat", "REAL"),
                ("lon", "REAL"),
                ("country", "TEXT"),
                ("state", "TEXT"),
                ("is_current", "BOOLEAN"),
                ("created_at", "INTEGER"),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl LocationRepository for SqliteLocationRepository<'_> {
    fn create_location(&self, location: &NewLocation) -> RepoResult<LocationId> {
        location.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if location.is_current {
            tx.execute(
                "UPDATE saved_locations SET is_current = 0 WHERE is_current = 1;",
                [],
            )?;
        }

        tx.execute(
            "INSERT INTO saved_locations (
                name,
                lat,
                lon,
                country,
                state,
                is_current
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                location.name.as_str(),
                location.lat,
                location.lon,
                location.country.as_deref(),
                location.state.as_deref(),
                bool_to_int(location.is_current),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "event=location_create module=repo status=ok id={} is_current={}",
            id, location.is_current
        );
        Ok(id)
    }

    fn get_location(&self, id: LocationId) -> RepoResult<Option<SavedLocation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LOCATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_location_row(row)?));
        }

        Ok(None)
    }

    fn list_locations(&self, query: &LocationListQuery) -> RepoResult<Vec<SavedLocation>> {
        let mut sql = format!("{LOCATION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if query.current_only {
            sql.push_str(" AND is_current = 1");
        }

        match query.order {
            LocationOrder::Insertion => sql.push_str(" ORDER BY id ASC"),
            LocationOrder::CurrentFirst => {
                sql.push_str(" ORDER BY is_current DESC, created_at DESC, id DESC")
            }
        }
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut locations = Vec::new();
        while let Some(row) = rows.next()? {
            locations.push(parse_location_row(row)?);
        }

        Ok(locations)
    }

    fn update_location(&self, id: LocationId, patch: &LocationPatch) -> RepoResult<()> {
        patch.validate()?;

        if patch.is_empty() {
            return if location_exists(self.conn, id)? {
                Ok(())
            } else {
                Err(RepoError::NotFound { entity: ENTITY, id })
            };
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(name) = &patch.name {
            assignments.push("name = ?");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(lat) = patch.lat {
            assignments.push("lat = ?");
            bind_values.push(Value::Real(lat));
        }
        if let Some(lon) = patch.lon {
            assignments.push("lon = ?");
            bind_values.push(Value::Real(lon));
        }
        if let Some(country) = &patch.country {
            assignments.push("country = ?");
            bind_values.push(optional_text(country));
        }
        if let Some(state) = &patch.state {
            assignments.push("state = ?");
            bind_values.push(optional_text(state));
        }
        if let Some(is_current) = patch.is_current {
            assignments.push("is_current = ?");
            bind_values.push(Value::Integer(bool_to_int(is_current)));
        }
        bind_values.push(Value::Integer(id));

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!(
                "UPDATE saved_locations SET {} WHERE id = ?;",
                assignments.join(", ")
            ),
            params_from_iter(bind_values),
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }

        if patch.is_current == Some(true) {
            tx.execute(
                "UPDATE saved_locations SET is_current = 0 WHERE is_current = 1 AND id != ?1;",
                [id],
            )?;
        }
        tx.commit()?;

        info!("event=location_update module=repo status=ok id={}", id);
        Ok(())
    }

    fn delete_location(&self, id: LocationId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM saved_locations WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: ENTITY, id });
        }

        info!("event=location_delete module=repo status=ok id={}", id);
        Ok(())
    }
}

fn parse_location_row(row: &Row<'_>) -> RepoResult<SavedLocation> {
    let is_current = parse_bool(row.get("is_current")?, "saved_locations.is_current")?;

    Ok(SavedLocation {
        id: row.get("id")?,
        name: row.get("name")?,
        lat: row.get("lat")?,
        lon: row.get("lon")?,
        country: row.get("country")?,
        state: row.get("state")?,
        is_current,
        created_at: row.get("created_at")?,
    })
}

fn location_exists(conn: &Connection, id: LocationId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM saved_locations WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}
