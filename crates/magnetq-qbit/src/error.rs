//! Error types raised while constructing the qBittorrent client.

use thiserror::Error;

/// Result alias for client construction.
pub type QbResult<T> = Result<T, QbError>;

/// Failures building a [`crate::QbClient`].
#[derive(Debug, Error)]
pub enum QbError {
    /// The Web UI base URL cannot carry API paths.
    #[error("invalid Web UI base URL")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    ClientBuild {
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}
