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

//! Magnet link discovery for listing pages.
//!
//! [`AnchorExtractor`] parses a page as HTML, reads the `href` of every anchor
//! element, and keeps the ones using the `magnet:` scheme. [`PageScraper`]
//! fetches a page over HTTP and exposes the result as a
//! [`magnetq_core::LinkSource`].

pub mod error;
pub mod extract;
pub mod fetch;

pub use error::{ScrapeError, ScrapeResult};
pub use extract::{AnchorExtractor, extract_magnet_links};
pub use fetch::PageScraper;
