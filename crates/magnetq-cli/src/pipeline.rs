//! End-to-end batch run over injected collaborators.

use std::time::Duration;

use anyhow::Context;
use magnetq_core::{
    AddBatch, BatchResolver, DEFAULT_COMPLETION_POLL_INTERVAL, DEFAULT_ITEM_POLL_INTERVAL,
    DEFAULT_LOGIN_TIMEOUT, DaemonClient, DownloadOrchestrator, LinkSource, PollPolicy,
    ReleaseMode, TorrentHandle, authenticate,
};
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::{CliError, CliResult};

/// Everything one invocation needs to know about its batch.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Page scanned for magnet links.
    pub url: String,
    /// Destination directory on the daemon host.
    pub save_path: String,
    /// Category left on the jobs after resolution.
    pub category: Option<String>,
    /// Start discipline.
    pub mode: ReleaseMode,
    /// Remove the jobs from the daemon once every one is complete.
    pub remove: bool,
    /// Bound on the login call.
    pub login_timeout: Duration,
    /// Per-item wait used by sequential release.
    pub item_poll: PollPolicy,
    /// Whole-batch wait used before removal.
    pub completion_poll: PollPolicy,
    /// Bound on all waiting in the run, measured from its start. Every item
    /// wait and the completion wait share it.
    pub deadline: Option<Duration>,
}

impl BatchRequest {
    /// Request with default timings: concurrent release, no removal.
    #[must_use]
    pub fn new(url: impl Into<String>, save_path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            save_path: save_path.into(),
            category: None,
            mode: ReleaseMode::Concurrent,
            remove: false,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            item_poll: PollPolicy::every(DEFAULT_ITEM_POLL_INTERVAL),
            completion_poll: PollPolicy::every(DEFAULT_COMPLETION_POLL_INTERVAL),
            deadline: None,
        }
    }

    /// Select the start discipline.
    #[must_use]
    pub const fn with_mode(mut self, mode: ReleaseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Give up on waiting once `deadline` has passed since the run started.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Remove the batch from the daemon once it completes.
    #[must_use]
    pub const fn with_removal(mut self, remove: bool) -> Self {
        self.remove = remove;
        self
    }
}

/// Where a job ended up when the run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Started; completion was not awaited.
    Released,
    /// Observed in a completion state.
    Complete,
    /// Complete and removed from the daemon; files kept.
    Removed,
}

impl JobStatus {
    /// Lower-case label used in table output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Released => "released",
            Self::Complete => "complete",
            Self::Removed => "removed",
        }
    }
}

/// One resolved job in the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    /// Daemon-assigned identifier.
    pub handle: TorrentHandle,
    /// Final status.
    pub status: JobStatus,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Identifier of the run, as recorded in the logs.
    pub run_id: String,
    /// Page that was scanned.
    pub url: String,
    /// Destination directory.
    pub save_path: String,
    /// `concurrent` or `sequential`.
    pub mode: &'static str,
    /// Magnet links found on the page, duplicates included.
    pub links_found: usize,
    /// Resolved jobs in daemon listing order.
    pub jobs: Vec<JobOutcome>,
}

const fn mode_label(mode: ReleaseMode) -> &'static str {
    match mode {
        ReleaseMode::Concurrent => "concurrent",
        ReleaseMode::Sequential => "sequential",
    }
}

/// Scrape, log in, resolve, release, and optionally wait and remove.
///
/// The scrape runs before login so a bad page fails without touching the
/// daemon. Cancellation through `cancel` stops any polling loop and the batch
/// is never removed afterwards.
///
/// # Errors
///
/// Returns [`CliError::Session`] when the login times out or is rejected,
/// [`CliError::Interrupted`] after cancellation, and [`CliError::Failure`] for
/// anything else.
#[instrument(name = "pipeline.run_batch", skip_all, fields(url = %request.url, mode = mode_label(request.mode)))]
pub async fn run_batch<S, C>(
    source: &S,
    client: &C,
    request: &BatchRequest,
    cancel: CancellationToken,
) -> CliResult<RunSummary>
where
    S: LinkSource + ?Sized,
    C: DaemonClient + ?Sized,
{
    let expires_at = request.deadline.map(|deadline| Instant::now() + deadline);
    let links = source
        .magnet_links(&request.url)
        .await
        .with_context(|| format!("failed to collect magnet links from {}", request.url))
        .map_err(CliError::failure)?;
    if links.is_empty() {
        warn!("no magnet links found on page");
    }
    let links_found = links.len();

    let session = authenticate(client, request.login_timeout).await?;

    let mut batch = AddBatch::new(links, request.save_path.clone());
    if let Some(category) = &request.category {
        batch = batch.with_category(category.clone());
    }
    let handles = BatchResolver::default()
        .add_and_resolve(session, &batch)
        .await?;

    let orchestrator = DownloadOrchestrator::new(session)
        .with_item_poll(request.item_poll)
        .with_completion_poll(request.completion_poll)
        .with_expiry(expires_at)
        .with_cancellation(cancel.clone());
    orchestrator.release(&handles, request.mode).await?;

    let mut status = match request.mode {
        ReleaseMode::Concurrent => JobStatus::Released,
        ReleaseMode::Sequential => JobStatus::Complete,
    };
    if request.remove {
        orchestrator.wait_until_complete(&handles).await?;
        if cancel.is_cancelled() {
            return Err(CliError::Interrupted("batch.remove"));
        }
        orchestrator.remove_all(&handles).await?;
        status = JobStatus::Removed;
    }

    info!(count = handles.len(), status = status.as_str(), "run finished");
    Ok(RunSummary {
        run_id: magnetq_telemetry::run_id().to_string(),
        url: request.url.clone(),
        save_path: request.save_path.clone(),
        mode: mode_label(request.mode),
        links_found,
        jobs: handles
            .into_iter()
            .map(|handle| JobOutcome { handle, status })
            .collect(),
    })
}
