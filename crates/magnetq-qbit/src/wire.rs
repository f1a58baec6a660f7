//! JSON payloads returned by the Web API.

use std::collections::HashMap;

use magnetq_core::{JobEntry, TorrentHandle, TorrentState};
use serde::Deserialize;
use serde::de::IgnoredAny;

/// Body answered by `auth/login` and `torrents/add` on failure.
pub const FAILS_BODY: &str = "Fails.";

/// `GET /api/v2/torrents/categories`: category objects keyed by name. Only the
/// names are used.
pub type QbCategories = HashMap<String, IgnoredAny>;

/// Entry of `GET /api/v2/torrents/info`; fields beyond these are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct QbTorrentInfo {
    /// Info-hash identifying the torrent.
    pub hash: String,
    /// State string, e.g. `pausedUP`.
    pub state: String,
}

impl From<QbTorrentInfo> for JobEntry {
    fn from(info: QbTorrentInfo) -> Self {
        Self {
            handle: TorrentHandle::new(info.hash),
            state: TorrentState::from(info.state),
        }
    }
}
