//! Producer of the magnet links that make up a batch.

use async_trait::async_trait;

use crate::model::MagnetLink;

/// Turns a page URL into the magnet links it references.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Magnet links in page order; duplicates are preserved.
    async fn magnet_links(&self, url: &str) -> anyhow::Result<Vec<MagnetLink>>;
}
