//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep request-handling layers decoupled from storage details.

pub mod challenge_service;
pub mod location_service;
pub mod progress_service;
