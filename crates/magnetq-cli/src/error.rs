//! CLI error type and exit codes.

use std::fmt::{self, Display, Formatter};

use magnetq_core::CoreError;

/// Exit code for bad arguments or configuration.
pub const EXIT_VALIDATION: i32 = 2;
/// Exit code for operational failures.
pub const EXIT_FAILURE: i32 = 3;
/// Exit code when no daemon session could be established.
pub const EXIT_SESSION: i32 = 4;
/// Exit code after an interrupt.
pub const EXIT_INTERRUPTED: i32 = 130;

/// CLI-level error distinguishing why a run stopped.
#[derive(Debug)]
pub enum CliError {
    /// Arguments or configuration were rejected before any daemon call.
    Validation(String),
    /// The daemon could not be logged into.
    Session(CoreError),
    /// The run was interrupted before it finished.
    Interrupted(&'static str),
    /// Any other failure.
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Build an operational failure.
    pub fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => EXIT_VALIDATION,
            Self::Session(_) => EXIT_SESSION,
            Self::Interrupted(_) => EXIT_INTERRUPTED,
            Self::Failure(_) => EXIT_FAILURE,
        }
    }

    /// Single-line message printed after `error: `.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Session(error) => error.to_string(),
            Self::Interrupted(operation) => format!("interrupted during {operation}"),
            Self::Failure(error) => match error.downcast_ref::<CoreError>().and_then(core_detail) {
                Some(detail) => format!("{error:#} [{detail}]"),
                None => format!("{error:#}"),
            },
        }
    }
}

fn core_detail(error: &CoreError) -> Option<String> {
    match error {
        CoreError::PartialResolution { expected, resolved } => {
            Some(format!("expected {expected}, resolved {resolved}"))
        }
        CoreError::PollTimeout { operation, waited } => {
            Some(format!("{operation} after {}s", waited.as_secs()))
        }
        CoreError::MissingJob { handle } => Some(format!("handle {handle}")),
        CoreError::TagUnavailable { attempts } => Some(format!("after {attempts} attempts")),
        CoreError::InvalidMagnet { value } => Some(value.clone()),
        CoreError::Daemon { operation, .. } => Some(format!("operation {operation}")),
        CoreError::LoginTimeout { .. } | CoreError::LoginFailed | CoreError::Cancelled { .. } => {
            None
        }
    }
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            error if error.is_session_failure() => Self::Session(error),
            CoreError::Cancelled { operation } => Self::Interrupted(operation),
            error => Self::Failure(error.into()),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn session_failures_exit_with_dedicated_code() {
        let err = CliError::from(CoreError::LoginTimeout {
            timeout: Duration::from_secs(10),
        });
        assert_eq!(err.exit_code(), EXIT_SESSION);
        assert!(err.display_message().contains("ensure the torrent daemon is running"));

        let err = CliError::from(CoreError::LoginFailed);
        assert_eq!(err.exit_code(), EXIT_SESSION);
        assert!(err.display_message().contains("credentials"));
    }

    #[test]
    fn cancellation_maps_to_interrupt() {
        let err = CliError::from(CoreError::Cancelled {
            operation: "batch.wait",
        });
        assert_eq!(err.exit_code(), EXIT_INTERRUPTED);
        assert_eq!(err.display_message(), "interrupted during batch.wait");
    }

    #[test]
    fn other_core_errors_are_failures() {
        let err = CliError::from(CoreError::PartialResolution {
            expected: 2,
            resolved: 1,
        });
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert_eq!(
            err.display_message(),
            "resolved handle count does not match submitted link count [expected 2, resolved 1]"
        );
        assert_eq!(CliError::validation("bad").exit_code(), EXIT_VALIDATION);
    }
}
