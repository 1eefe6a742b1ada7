//! Request-scoped storage handle.
//!
//! # Responsibility
//! - Carry the database location explicitly instead of a process-global
//!   connection.
//! - Acquire one connection per request and release it on every exit path.
//!
//! # Invariants
//! - A session connection never outlives the closure it was opened for.
//! - Sessions always observe a fully migrated schema.

use super::migrations::reset_schema;
use super::open::{open_db, open_db_unmigrated};
use super::{DbError, DbResult};
use crate::config::StoreConfig;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Explicit storage context threaded through request handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreContext {
    db_path: PathBuf,
}

impl StoreContext {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.db_path.clone())
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Runs `f` with a freshly opened connection.
    ///
    /// The connection is dropped when this call returns, whether `f`
    /// succeeded, failed, or the open itself failed.
    pub fn with_session<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let conn = open_db(&self.db_path)?;
        f(&conn)
    }

    /// Recreates the schema, deleting every stored row.
    pub fn initialize(&self) -> DbResult<()> {
        let mut conn = open_db_unmigrated(&self.db_path)?;
        reset_schema(&mut conn)
    }
}
