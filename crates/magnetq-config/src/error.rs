//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures raised while loading or validating connection settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file")]
    Io {
        /// File path.
        path: PathBuf,
        /// Source IO error.
        #[source]
        source: io::Error,
    },
    /// The YAML document did not match the expected shape.
    #[error("failed to parse configuration document")]
    Parse {
        /// Source YAML error.
        #[source]
        source: serde_yaml::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when it is safe to echo.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Host and port did not combine into a usable URL.
    #[error("invalid Web UI address")]
    InvalidUrl {
        /// Address that failed to parse.
        value: String,
        /// Source URL error.
        #[source]
        source: url::ParseError,
    },
}

impl ConfigError {
    /// One-line description including the field context.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Io { path, source } => {
                format!("{self} '{}': {source}", path.display())
            }
            Self::Parse { source } => format!("{self}: {source}"),
            Self::InvalidField {
                section,
                field,
                value,
                reason,
            } => match value {
                Some(value) => format!("{self} '{section}.{field}' ({value}): {reason}"),
                None => format!("{self} '{section}.{field}': {reason}"),
            },
            Self::InvalidUrl { value, source } => format!("{self} '{value}': {source}"),
        }
    }
}
