//! Start, completion polling, and cleanup for a resolved batch.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::daemon::DaemonClient;
use crate::error::{CoreError, CoreResult};
use crate::model::{JobFilter, ReleaseMode, TorrentHandle, TorrentState};
use crate::poll::PollPolicy;
use crate::session::Session;

/// Delay between state checks while waiting on one item in sequential mode.
pub const DEFAULT_ITEM_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Delay between state checks while waiting for the whole batch.
pub const DEFAULT_COMPLETION_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Drives a resolved batch through release, completion, and removal.
#[derive(Debug)]
pub struct DownloadOrchestrator<'a, C: ?Sized> {
    session: Session<'a, C>,
    item_poll: PollPolicy,
    completion_poll: PollPolicy,
    expires_at: Option<Instant>,
    cancel: CancellationToken,
}

impl<'a, C: DaemonClient + ?Sized> DownloadOrchestrator<'a, C> {
    /// Orchestrator with the default, unbounded poll cadence.
    #[must_use]
    pub fn new(session: Session<'a, C>) -> Self {
        Self {
            session,
            item_poll: PollPolicy::every(DEFAULT_ITEM_POLL_INTERVAL),
            completion_poll: PollPolicy::every(DEFAULT_COMPLETION_POLL_INTERVAL),
            expires_at: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Override the cadence of the per-item wait used by sequential release.
    #[must_use]
    pub const fn with_item_poll(mut self, policy: PollPolicy) -> Self {
        self.item_poll = policy;
        self
    }

    /// Override the cadence of [`Self::wait_until_complete`].
    #[must_use]
    pub const fn with_completion_poll(mut self, policy: PollPolicy) -> Self {
        self.completion_poll = policy;
        self
    }

    /// Stop every wait at `expires_at`, however many per-item waits came
    /// before. `None` leaves only the per-policy deadlines.
    #[must_use]
    pub const fn with_expiry(mut self, expires_at: Option<Instant>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Abort polling when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Start the batch.
    ///
    /// `Concurrent` issues a single resume for every handle and returns at
    /// once. `Sequential` resumes one handle, waits for it to report a
    /// completion state, then moves to the next, in `handles` order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Daemon`] on a failed call, and in sequential mode
    /// [`CoreError::PollTimeout`], [`CoreError::Cancelled`], or
    /// [`CoreError::MissingJob`] from the per-item wait.
    #[instrument(name = "orchestrator.release", skip_all, fields(count = handles.len(), mode = ?mode))]
    pub async fn release(&self, handles: &[TorrentHandle], mode: ReleaseMode) -> CoreResult<()> {
        if handles.is_empty() {
            return Ok(());
        }
        let client = self.session.client();
        match mode {
            ReleaseMode::Concurrent => {
                client
                    .resume(handles)
                    .await
                    .map_err(|err| CoreError::daemon("torrents.resume", err))?;
                info!(count = handles.len(), "batch released");
            }
            ReleaseMode::Sequential => {
                for (position, handle) in handles.iter().enumerate() {
                    client
                        .resume(std::slice::from_ref(handle))
                        .await
                        .map_err(|err| CoreError::daemon("torrents.resume", err))?;
                    info!(%handle, position, total = handles.len(), "item released");
                    self.wait_for_item(handle).await?;
                    info!(%handle, "item complete");
                }
            }
        }
        Ok(())
    }

    /// Point-in-time check that every handle reports a completion state.
    ///
    /// An empty batch is complete.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingJob`] when a handle is absent from the
    /// daemon's listing, or [`CoreError::Daemon`] when the listing fails.
    pub async fn all_complete(&self, handles: &[TorrentHandle]) -> CoreResult<bool> {
        if handles.is_empty() {
            return Ok(true);
        }
        let states = self.states(handles).await?;
        Ok(states.iter().all(TorrentState::is_complete))
    }

    /// Poll [`Self::all_complete`] until it holds.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::PollTimeout`] and [`CoreError::Cancelled`] from
    /// the completion poll, plus any [`Self::all_complete`] failure.
    #[instrument(name = "orchestrator.wait_until_complete", skip_all, fields(count = handles.len()))]
    pub async fn wait_until_complete(&self, handles: &[TorrentHandle]) -> CoreResult<()> {
        let mut poller = self
            .completion_poll
            .start_until("batch.wait", &self.cancel, self.expires_at);
        loop {
            poller.ensure_active()?;
            if self.all_complete(handles).await? {
                info!(count = handles.len(), "batch complete");
                return Ok(());
            }
            debug!("batch not yet complete");
            poller.tick().await?;
        }
    }

    /// Remove every handle from the daemon, leaving downloaded files on disk.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Daemon`] when the deletion call fails.
    #[instrument(name = "orchestrator.remove_all", skip_all, fields(count = handles.len()))]
    pub async fn remove_all(&self, handles: &[TorrentHandle]) -> CoreResult<()> {
        if handles.is_empty() {
            return Ok(());
        }
        self.session
            .client()
            .delete(handles, false)
            .await
            .map_err(|err| CoreError::daemon("torrents.delete", err))?;
        info!(count = handles.len(), "batch removed; files kept");
        Ok(())
    }

    /// Current daemon state for each handle, in `handles` order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingJob`] when a handle is absent from the listing.
    pub async fn states(&self, handles: &[TorrentHandle]) -> CoreResult<Vec<TorrentState>> {
        let listed: HashMap<TorrentHandle, TorrentState> = self
            .session
            .client()
            .list_jobs(&JobFilter::Handles(handles.to_vec()))
            .await
            .map_err(|err| CoreError::daemon("torrents.info", err))?
            .into_iter()
            .map(|job| (job.handle, job.state))
            .collect();

        handles
            .iter()
            .map(|handle| {
                listed
                    .get(handle)
                    .cloned()
                    .ok_or_else(|| CoreError::MissingJob {
                        handle: handle.clone(),
                    })
            })
            .collect()
    }

    async fn wait_for_item(&self, handle: &TorrentHandle) -> CoreResult<()> {
        let mut poller = self
            .item_poll
            .start_until("item.wait", &self.cancel, self.expires_at);
        let single = std::slice::from_ref(handle);
        loop {
            poller.ensure_active()?;
            let state = self
                .states(single)
                .await?
                .pop()
                .ok_or_else(|| CoreError::MissingJob {
                    handle: handle.clone(),
                })?;
            if state.is_complete() {
                return Ok(());
            }
            debug!(%handle, %state, "waiting on item");
            poller.tick().await?;
        }
    }
}
