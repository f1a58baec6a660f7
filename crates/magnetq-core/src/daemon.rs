//! Daemon capability consumed by the orchestration core.

use std::collections::HashSet;
use std::error::Error;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{AddBatch, JobEntry, JobFilter, TorrentHandle};

/// Convenience alias for daemon call results.
pub type DaemonResult<T> = Result<T, DaemonError>;

/// Errors surfaced by a [`DaemonClient`] implementation.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Credentials were rejected or the session is no longer valid.
    #[error("daemon rejected credentials")]
    Unauthorized,
    /// The daemon refused a mutation because the target already exists.
    #[error("daemon reported a conflict")]
    Conflict {
        /// Operation identifier.
        operation: &'static str,
        /// Daemon-provided detail.
        detail: String,
    },
    /// The request never produced a usable response.
    #[error("daemon request failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The daemon answered with something this client cannot interpret.
    #[error("unexpected daemon response")]
    Protocol {
        /// Operation identifier.
        operation: &'static str,
        /// Description of the unexpected payload or status.
        detail: String,
    },
}

/// Remote torrent daemon operations used by the resolver and orchestrator.
///
/// Implementations hold their own session state; [`crate::authenticate`]
/// must succeed before any other call is made.
#[async_trait]
pub trait DaemonClient: Send + Sync {
    /// Establish an authenticated session.
    async fn login(&self) -> DaemonResult<()>;

    /// Names of every grouping label currently known to the daemon.
    async fn labels(&self) -> DaemonResult<HashSet<String>>;

    /// Create a grouping label; returns [`DaemonError::Conflict`] when it already exists.
    async fn create_label(&self, label: &str, save_path: &str) -> DaemonResult<()>;

    /// Submit every link in `batch` paused, carrying `label`, saved under the batch save path.
    async fn add_batch(&self, batch: &AddBatch, label: &str) -> DaemonResult<()>;

    /// List jobs matching `filter`, in the daemon's order.
    async fn list_jobs(&self, filter: &JobFilter) -> DaemonResult<Vec<JobEntry>>;

    /// Assign `label` to `handles`.
    async fn set_label(&self, handles: &[TorrentHandle], label: &str) -> DaemonResult<()>;

    /// Remove grouping labels; jobs carrying them are left unlabelled.
    async fn remove_labels(&self, labels: &[String]) -> DaemonResult<()>;

    /// Start (resume) `handles`.
    async fn resume(&self, handles: &[TorrentHandle]) -> DaemonResult<()>;

    /// Drop `handles` from the job list, deleting downloaded data only when asked.
    async fn delete(&self, handles: &[TorrentHandle], delete_files: bool) -> DaemonResult<()>;
}
