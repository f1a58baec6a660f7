#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Orchestration core for bulk magnet submission against a remote torrent daemon.
//!
//! Layout: `model.rs` (links, handles, job states), `daemon.rs` (`DaemonClient`
//! seam), `source.rs` (`LinkSource` seam), `session.rs` (deadline-bounded
//! authentication), `tag.rs` (disposable grouping labels), `resolver.rs`
//! (add-then-recover handles), `orchestrator.rs` (release/poll/cleanup),
//! `poll.rs` (interval, backoff, deadline, cancellation).

pub mod daemon;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod poll;
pub mod resolver;
pub mod session;
pub mod source;
pub mod tag;

pub use daemon::{DaemonClient, DaemonError, DaemonResult};
pub use error::{CoreError, CoreResult};
pub use model::{AddBatch, JobEntry, JobFilter, MagnetLink, ReleaseMode, TorrentHandle, TorrentState};
pub use orchestrator::{
    DEFAULT_COMPLETION_POLL_INTERVAL, DEFAULT_ITEM_POLL_INTERVAL, DownloadOrchestrator,
};
pub use poll::{Backoff, PollPolicy, Poller};
pub use resolver::BatchResolver;
pub use session::{DEFAULT_LOGIN_TIMEOUT, Session, authenticate};
pub use source::LinkSource;
pub use tag::{MAX_TAG_ATTEMPTS, TAG_LENGTH};
