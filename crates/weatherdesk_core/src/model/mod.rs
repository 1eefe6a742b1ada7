//! Domain model for saved locations and the challenge/progress game layer.
//!
//! # Responsibility
//! - Define canonical records returned by repositories.
//! - Define create inputs and partial patches with their validation rules.
//!
//! # Invariants
//! - Ids and timestamps are assigned by storage, never by callers.
//! - The three collections are independent; the only cross-reference is
//!   `UserProgress::challenge_id`, validated by the access layer.

pub mod challenge;
pub mod location;
pub mod progress;
pub mod validation;
