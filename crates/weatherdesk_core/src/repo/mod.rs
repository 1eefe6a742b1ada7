//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-collection data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate inputs before touching SQL.
//! - Repository APIs return semantic errors (`NotFound`, constraint
//!   violations) in addition to DB transport errors.
//! - Repositories only accept connections at the latest schema version.

mod common;
pub mod challenge_repo;
pub mod location_repo;
pub mod progress_repo;

pub use common::{ErrorKind, RepoError, RepoResult};
