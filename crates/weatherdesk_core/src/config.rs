//! Runtime configuration resolved from the process environment.
//!
//! # Responsibility
//! - Resolve the database file location for the current deployment.
//! - Resolve optional logging level and directory.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolution never fails; invalid log settings surface later from
//!   `init_logging`.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "WEATHERDESK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "WEATHERDESK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "WEATHERDESK_LOG_DIR";
/// Set by the hosting platform; switches storage to its persistent volume.
pub const HOSTED_MARKER_ENV: &str = "RENDER";

const DEFAULT_DB_FILE_NAME: &str = "weather_app.db";
const HOSTED_DB_PATH: &str = "/data/weather_app.db";

/// Resolved store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Logging stays disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup.
    ///
    /// Precedence for `db_path`: explicit `WEATHERDESK_DB_PATH`, then the
    /// hosted volume when `RENDER` is present, then `weather_app.db` in the
    /// working directory.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = if let Some(explicit) = non_blank(lookup(DB_PATH_ENV)) {
            PathBuf::from(explicit)
        } else if lookup(HOSTED_MARKER_ENV).is_some() {
            PathBuf::from(HOSTED_DB_PATH)
        } else {
            PathBuf::from(DEFAULT_DB_FILE_NAME)
        };

        let log_level = non_blank(lookup(LOG_LEVEL_ENV))
            .unwrap_or_else(|| default_log_level().to_string());
        let log_dir = non_blank(lookup(LOG_DIR_ENV)).map(PathBuf::from);

        Self {
            db_path,
            log_level,
            log_dir,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, DB_PATH_ENV, HOSTED_MARKER_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn resolve(pairs: &[(&str, &str)]) -> StoreConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        StoreConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_database_file() {
        let config = resolve(&[]);
        assert_eq!(config.db_path, PathBuf::from("weather_app.db"));
        assert!(config.log_dir.is_none());
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn hosted_marker_switches_to_data_volume() {
        let config = resolve(&[(HOSTED_MARKER_ENV, "true")]);
        assert_eq!(config.db_path, PathBuf::from("/data/weather_app.db"));
    }

    #[test]
    fn explicit_path_wins_over_hosted_marker() {
        let config = resolve(&[
            (HOSTED_MARKER_ENV, "true"),
            (DB_PATH_ENV, " /tmp/custom.db "),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/custom.db"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = resolve(&[
            (DB_PATH_ENV, "   "),
            (LOG_DIR_ENV, ""),
            (LOG_LEVEL_ENV, " "),
        ]);
        assert_eq!(config.db_path, PathBuf::from("weather_app.db"));
        assert!(config.log_dir.is_none());
        assert!(!config.log_level.trim().is_empty());
    }

    #[test]
    fn log_settings_are_read() {
        let config = resolve(&[
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "/var/log/weatherdesk"),
        ]);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/weatherdesk")));
    }
}
