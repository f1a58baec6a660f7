//! Domain types shared by the resolver, orchestrator, and daemon adapters.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// URI scheme prefix every magnet link carries.
pub const MAGNET_SCHEME: &str = "magnet:";

/// Opaque magnet URI. Only the scheme prefix is checked; the rest is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MagnetLink(String);

impl MagnetLink {
    /// Accept `value` when it starts with the `magnet:` scheme prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidMagnet`] for anything else.
    pub fn parse(value: impl Into<String>) -> CoreResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.starts_with(MAGNET_SCHEME) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(CoreError::InvalidMagnet { value })
        }
    }

    /// Borrow the URI text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MagnetLink {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::parse(value)
    }
}

impl From<MagnetLink> for String {
    fn from(link: MagnetLink) -> Self {
        link.0
    }
}

impl Display for MagnetLink {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Identifier the daemon assigned to one submitted job (the info-hash for qBittorrent).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TorrentHandle(String);

impl TorrentHandle {
    /// Wrap a daemon-issued identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TorrentHandle {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Job state as reported by the daemon.
///
/// Only [`TorrentState::is_complete`] drives orchestration; the remaining
/// variants exist so logs and summaries can show what the daemon said.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TorrentState {
    /// Queued and paused, the state every batch is added in.
    PausedDownload,
    /// Paused after finishing (`pausedUP`).
    PausedUpload,
    /// Stopped after finishing (`stoppedUP`, the qBittorrent 5 spelling).
    StoppedUpload,
    /// Stopped before finishing (`stoppedDL`).
    StoppedDownload,
    /// Actively downloading.
    Downloading,
    /// Downloading but no peers are sending data.
    StalledDownload,
    /// Fetching metadata for a magnet link.
    FetchingMetadata,
    /// Waiting in the daemon's download queue.
    QueuedDownload,
    /// Seeding.
    Uploading,
    /// Seeding with no connected leechers.
    StalledUpload,
    /// Checking data on disk.
    Checking,
    /// Moving data between directories.
    Moving,
    /// Daemon reported an I/O or similar failure.
    Error,
    /// Files are missing from disk.
    MissingFiles,
    /// Any state string this crate does not know about.
    Other(String),
}

impl TorrentState {
    /// Whether the daemon reports the job as finished and no longer running.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::PausedUpload | Self::StoppedUpload)
    }

    /// Wire spelling used by the daemon.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PausedDownload => "pausedDL",
            Self::PausedUpload => "pausedUP",
            Self::StoppedUpload => "stoppedUP",
            Self::StoppedDownload => "stoppedDL",
            Self::Downloading => "downloading",
            Self::StalledDownload => "stalledDL",
            Self::FetchingMetadata => "metaDL",
            Self::QueuedDownload => "queuedDL",
            Self::Uploading => "uploading",
            Self::StalledUpload => "stalledUP",
            Self::Checking => "checkingDL",
            Self::Moving => "moving",
            Self::Error => "error",
            Self::MissingFiles => "missingFiles",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for TorrentState {
    fn from(value: &str) -> Self {
        match value {
            "pausedDL" => Self::PausedDownload,
            "pausedUP" => Self::PausedUpload,
            "stoppedUP" => Self::StoppedUpload,
            "stoppedDL" => Self::StoppedDownload,
            "downloading" | "forcedDL" => Self::Downloading,
            "stalledDL" => Self::StalledDownload,
            "metaDL" | "forcedMetaDL" => Self::FetchingMetadata,
            "queuedDL" => Self::QueuedDownload,
            "uploading" | "forcedUP" => Self::Uploading,
            "stalledUP" => Self::StalledUpload,
            "checkingDL" | "checkingUP" | "checkingResumeData" => Self::Checking,
            "moving" => Self::Moving,
            "error" => Self::Error,
            "missingFiles" => Self::MissingFiles,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for TorrentState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<TorrentState> for String {
    fn from(state: TorrentState) -> Self {
        state.as_str().to_string()
    }
}

impl Display for TorrentState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One row of the daemon's job list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    /// Daemon-assigned identifier.
    pub handle: TorrentHandle,
    /// Reported state at the time of the listing.
    pub state: TorrentState,
}

/// Selector for `DaemonClient::list_jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFilter {
    /// Jobs carrying the given grouping label.
    Label(String),
    /// Jobs with the given handles.
    Handles(Vec<TorrentHandle>),
}

/// Request to submit a batch of magnet links in one daemon call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddBatch {
    /// Links to submit, in page order.
    pub links: Vec<MagnetLink>,
    /// Destination directory on the daemon host.
    pub save_path: String,
    /// Category to leave on the jobs once resolution finishes.
    pub category: Option<String>,
}

impl AddBatch {
    /// Build a batch without a destination category.
    #[must_use]
    pub fn new(links: Vec<MagnetLink>, save_path: impl Into<String>) -> Self {
        Self {
            links,
            save_path: save_path.into(),
            category: None,
        }
    }

    /// Leave `category` on the resolved jobs.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Links with duplicates removed, first occurrence wins.
    #[must_use]
    pub fn distinct_links(&self) -> Vec<MagnetLink> {
        let mut seen = std::collections::HashSet::new();
        self.links
            .iter()
            .filter(|link| seen.insert(link.as_str()))
            .cloned()
            .collect()
    }
}

/// Start discipline for a resolved batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseMode {
    /// One resume call for the whole batch; returns immediately.
    #[default]
    Concurrent,
    /// Resume one handle at a time and wait for each to complete.
    Sequential,
}

impl ReleaseMode {
    /// Map the command-line "one by one" flag.
    #[must_use]
    pub const fn from_sequential(sequential: bool) -> Self {
        if sequential {
            Self::Sequential
        } else {
            Self::Concurrent
        }
    }
}
