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
#![allow(clippy::redundant_pub_crate)]

//! Command-line front end that sends a page's magnet links to qBittorrent.
//!
//! Layout:
//! - `cli.rs`: argument parsing, wiring, and `run()`
//! - `error.rs`: `CliError` and exit codes
//! - `pipeline.rs`: `run_batch`, the scrape, login, resolve, release, cleanup sequence
//! - `output.rs`: run summary renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub mod error;
pub mod output;
pub mod pipeline;

pub use cli::run;
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, render_summary};
pub use pipeline::{BatchRequest, JobOutcome, JobStatus, RunSummary, run_batch};
