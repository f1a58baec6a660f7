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

//! qBittorrent Web API (`/api/v2`) adapter for the orchestration core.
//!
//! Layout: `client.rs` (`QbClient`, the `DaemonClient` implementation),
//! `wire.rs` (JSON payloads), `error.rs` (construction errors).

pub mod client;
pub mod error;
pub mod wire;

pub use client::{Credentials, QbClient};
pub use error::{QbError, QbResult};
