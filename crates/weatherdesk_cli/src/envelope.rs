//! JSON response envelopes and exit-code mapping.
//!
//! # Responsibility
//! - Render every command outcome as exactly one JSON document.
//! - Translate the core error taxonomy into user-facing messages.
//!
//! # Invariants
//! - Infrastructure details are logged, never printed to the user.
//! - Exit codes: `0` success, `2` user error, `1` infrastructure.

use log::error;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use weatherdesk_core::{DbError, ErrorKind, LoggingError, RepoError};

pub const STORAGE_UNAVAILABLE_MESSAGE: &str =
    "Storage is temporarily unavailable. Please try again later.";

/// One printed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Envelope {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        data: Value,
    },
    Error {
        kind: &'static str,
        message: String,
    },
}

/// Successful command result before rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub message: Option<&'static str>,
    pub data: Value,
}

impl Outcome {
    pub fn data<T: Serialize>(data: &T) -> Result<Self, CliError> {
        Ok(Self {
            message: None,
            data: serde_json::to_value(data)?,
        })
    }

    pub fn message(message: &'static str) -> Self {
        Self {
            message: Some(message),
            data: Value::Null,
        }
    }

    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Failure of one CLI invocation.
#[derive(Debug)]
pub enum CliError {
    Repo(RepoError),
    Logging(LoggingError),
    Render(serde_json::Error),
    /// Arguments were parsed but do not form a valid request.
    Usage(String),
}

impl CliError {
    /// Stable machine-readable error class printed as `kind`.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Repo(err) => match err.kind() {
                ErrorKind::ConstraintViolation => "constraint_violation",
                ErrorKind::NotFound => "not_found",
                ErrorKind::Infrastructure => "infrastructure",
            },
            Self::Logging(err) if is_logging_config_error(err) => "usage",
            Self::Logging(_) | Self::Render(_) => "infrastructure",
            Self::Usage(_) => "usage",
        }
    }

    pub fn is_infrastructure(&self) -> bool {
        self.kind_label() == "infrastructure"
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_infrastructure() {
            1
        } else {
            2
        }
    }

    /// Message safe to show to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Repo(err) if err.kind() == ErrorKind::Infrastructure => {
                STORAGE_UNAVAILABLE_MESSAGE.to_string()
            }
            Self::Repo(err) => err.to_string(),
            Self::Logging(err) if is_logging_config_error(err) => err.to_string(),
            Self::Logging(_) | Self::Render(_) => STORAGE_UNAVAILABLE_MESSAGE.to_string(),
            Self::Usage(message) => message.clone(),
        }
    }
}

/// Level and directory problems come from the caller's configuration.
fn is_logging_config_error(err: &LoggingError) -> bool {
    matches!(
        err,
        LoggingError::UnsupportedLevel(_) | LoggingError::InvalidDirectory(_)
    )
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "failed to render response: {err}"),
            Self::Usage(message) => f.write_str(message),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Render(err) => Some(err),
            Self::Usage(_) => None,
        }
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Render(value)
    }
}

/// Builds the envelope and exit code for a finished command.
pub fn render(result: Result<Outcome, CliError>) -> (Envelope, u8) {
    match result {
        Ok(outcome) => (
            Envelope::Success {
                message: outcome.message.map(str::to_string),
                data: outcome.data,
            },
            0,
        ),
        Err(err) => {
            if err.is_infrastructure() {
                error!(
                    "event=cli_command module=cli status=error kind={} detail={}",
                    err.kind_label(),
                    err
                );
            }
            (
                Envelope::Error {
                    kind: err.kind_label(),
                    message: err.user_message(),
                },
                err.exit_code(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{render, CliError, Envelope, Outcome, STORAGE_UNAVAILABLE_MESSAGE};
    use serde_json::json;
    use weatherdesk_core::{DbError, LoggingError, RepoError, ValidationError};

    #[test]
    fn success_envelope_carries_data_and_message() {
        let outcome = Outcome::data(&json!({"id": 1}))
            .unwrap()
            .with_message("Location saved successfully");
        let (envelope, code) = render(Ok(outcome));

        assert_eq!(code, 0);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "status": "success",
                "message": "Location saved successfully",
                "data": {"id": 1}
            })
        );
    }

    #[test]
    fn success_without_message_omits_field() {
        let (envelope, _) = render(Ok(Outcome::data(&Vec::<i64>::new()).unwrap()));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": "success", "data": []})
        );
    }

    #[test]
    fn validation_errors_exit_with_two_and_explain() {
        let err = CliError::from(RepoError::from(ValidationError::MissingField {
            field: "name",
        }));
        let (envelope, code) = render(Err(err));

        assert_eq!(code, 2);
        assert_eq!(
            envelope,
            Envelope::Error {
                kind: "constraint_violation",
                message: "missing required field `name`".to_string(),
            }
        );
    }

    #[test]
    fn not_found_exits_with_two() {
        let err = CliError::from(RepoError::NotFound {
            entity: "saved location",
            id: 4,
        });
        assert_eq!(err.kind_label(), "not_found");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.user_message(), "saved location not found: 4");
    }

    #[test]
    fn infrastructure_errors_hide_details() {
        let err = CliError::from(DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        });
        let (envelope, code) = render(Err(err));

        assert_eq!(code, 1);
        assert_eq!(
            envelope,
            Envelope::Error {
                kind: "infrastructure",
                message: STORAGE_UNAVAILABLE_MESSAGE.to_string(),
            }
        );
    }

    #[test]
    fn usage_errors_keep_their_message() {
        let err = CliError::Usage("nothing to update".to_string());
        assert_eq!(err.kind_label(), "usage");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.user_message(), "nothing to update");
    }

    #[test]
    fn bad_logging_config_is_a_usage_error() {
        let err = CliError::from(LoggingError::UnsupportedLevel("loud".to_string()));
        let (envelope, code) = render(Err(err));

        assert_eq!(code, 2);
        assert_eq!(
            envelope,
            Envelope::Error {
                kind: "usage",
                message: "unsupported log level `loud`; expected trace|debug|info|warn|error"
                    .to_string(),
            }
        );
    }

    #[test]
    fn logger_failures_hide_details() {
        let err = CliError::from(LoggingError::AlreadyInitialized {
            active: "info@/var/log/weatherdesk".to_string(),
            requested: "debug@/home/someone/logs".to_string(),
        });
        let (envelope, code) = render(Err(err));

        assert_eq!(code, 1);
        assert_eq!(
            envelope,
            Envelope::Error {
                kind: "infrastructure",
                message: STORAGE_UNAVAILABLE_MESSAGE.to_string(),
            }
        );
    }
}
