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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (link fixtures, static link source), stub.rs (scripted in-memory daemon).

pub mod fixtures;
pub mod stub;

pub use fixtures::{StaticLinkSource, magnet, magnets};
pub use stub::{DaemonCall, LoginBehavior, StubDaemon};
