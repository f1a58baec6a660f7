//! Error types for page scraping.

use thiserror::Error;

/// Result alias for scraping operations.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Failures raised while fetching or parsing a listing page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The anchor selector failed to parse.
    #[error("failed to parse CSS selector")]
    Selector {
        /// Selector text.
        selector: &'static str,
        /// Parser message.
        reason: String,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    ClientBuild {
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The page request failed before a response arrived.
    #[error("failed to fetch listing page")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The page answered with a non-success status.
    #[error("listing page returned an error status")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_context() {
        let err = ScrapeError::Status {
            url: "http://example.test/list".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "listing page returned an error status");
        assert!(matches!(err, ScrapeError::Status { status: 404, .. }));
    }
}
