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

//! Connection settings for the torrent daemon's Web UI.
//!
//! # Design
//! - A YAML document supplies the `web_ui` section; `MAGNETQ_*` environment
//!   variables override individual fields.
//! - Settings are read and validated once at startup and never re-read.

pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    ENV_HOST, ENV_PASSWORD, ENV_PORT, ENV_USERNAME, apply_overrides, load, load_with, parse,
};
pub use model::{ConnectionConfig, DEFAULT_SCHEME};
