//! Error types for batch orchestration.
//!
//! # Design
//! - Messages stay constant; context travels in fields.
//! - Session failures carry user guidance in the message because they end the run.
//! - Daemon failures keep the operation identifier and the source error.

use std::time::Duration;

use thiserror::Error;

use crate::daemon::DaemonError;
use crate::model::TorrentHandle;

/// Convenience alias for orchestration results.
pub type CoreResult<T> = Result<T, CoreError>;

/// Primary error type for the orchestration core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The daemon did not answer authentication within the bound.
    #[error("login timed out; ensure the torrent daemon is running")]
    LoginTimeout {
        /// Bound that was exceeded.
        timeout: Duration,
    },
    /// The daemon answered but rejected the configured credentials.
    #[error("login failed; ensure the configured Web UI credentials are accurate")]
    LoginFailed,
    /// Fewer or more handles came back than distinct links were submitted.
    #[error("resolved handle count does not match submitted link count")]
    PartialResolution {
        /// Distinct links submitted.
        expected: usize,
        /// Handles carrying the batch tag.
        resolved: usize,
    },
    /// A polling loop exceeded its configured deadline.
    #[error("polling deadline exceeded")]
    PollTimeout {
        /// Operation identifier.
        operation: &'static str,
        /// Time spent polling before giving up.
        waited: Duration,
    },
    /// A polling loop was interrupted before completion.
    #[error("operation cancelled")]
    Cancelled {
        /// Operation identifier.
        operation: &'static str,
    },
    /// A handle from the batch no longer appears in the daemon's job list.
    #[error("job missing from daemon listing")]
    MissingJob {
        /// Handle that vanished.
        handle: TorrentHandle,
    },
    /// No unused tag could be claimed.
    #[error("unable to claim an unused grouping label")]
    TagUnavailable {
        /// Generation attempts made.
        attempts: usize,
    },
    /// Value handed to the core was not a magnet URI.
    #[error("not a magnet link")]
    InvalidMagnet {
        /// Offending value.
        value: String,
    },
    /// A daemon call failed.
    #[error("daemon operation failed")]
    Daemon {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying daemon error.
        #[source]
        source: DaemonError,
    },
}

impl CoreError {
    pub(crate) const fn daemon(operation: &'static str, source: DaemonError) -> Self {
        Self::Daemon { operation, source }
    }

    /// Whether the failure happened while establishing the session.
    #[must_use]
    pub const fn is_session_failure(&self) -> bool {
        matches!(self, Self::LoginTimeout { .. } | Self::LoginFailed)
    }
}
