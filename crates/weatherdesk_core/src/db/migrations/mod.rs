//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//! - Rebuild the schema from scratch on explicit request.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, TransactionBehavior};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_lookup_indexes.sql"),
    },
];

const RESET_SQL: &str = include_str!("reset.sql");

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

/// Drops every store table and recreates the schema at the latest version.
///
/// # Side effects
/// - Irrecoverably deletes all saved locations, challenges and progress rows.
/// - Runs in one immediate transaction; on failure the previous schema and
///   rows are left untouched.
/// - Emits `schema_reset` logging events.
pub fn reset_schema(conn: &mut Connection) -> DbResult<()> {
    info!("event=schema_reset module=db status=start");

    let result = (|| -> DbResult<()> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(RESET_SQL)?;
        for migration in MIGRATIONS {
            tx.execute_batch(migration.sql)?;
        }
        tx.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))?;
        tx.commit()?;
        Ok(())
    })();

    match &result {
        Ok(()) => info!(
            "event=schema_reset module=db status=ok version={}",
            latest_version()
        ),
        Err(err) => error!(
            "event=schema_reset module=db status=error error_code=schema_reset_failed error={}",
            err
        ),
    }

    result
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
