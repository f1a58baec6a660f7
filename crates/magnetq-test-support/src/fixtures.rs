//! Link fixtures and a canned link source.

use std::sync::{Mutex, PoisonError};

use anyhow::anyhow;
use async_trait::async_trait;
use magnetq_core::{LinkSource, MagnetLink};

/// Deterministic magnet link for fixture `index`.
///
/// # Panics
///
/// Never in practice; the generated text always carries the magnet scheme.
#[must_use]
pub fn magnet(index: usize) -> MagnetLink {
    MagnetLink::parse(format!("magnet:?xt=urn:btih:{index:040x}&dn=fixture-{index}"))
        .unwrap_or_else(|_| unreachable!("fixture links always carry the magnet scheme"))
}

/// `count` distinct fixture links.
#[must_use]
pub fn magnets(count: usize) -> Vec<MagnetLink> {
    (0..count).map(magnet).collect()
}

/// Link source returning a fixed list, or failing when built with [`StaticLinkSource::failing`].
#[derive(Debug, Default)]
pub struct StaticLinkSource {
    links: Option<Vec<MagnetLink>>,
    requested: Mutex<Vec<String>>,
}

impl StaticLinkSource {
    /// Source that always returns `links`.
    #[must_use]
    pub const fn new(links: Vec<MagnetLink>) -> Self {
        Self {
            links: Some(links),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Source whose fetch always fails.
    #[must_use]
    pub const fn failing() -> Self {
        Self {
            links: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// URLs requested so far.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LinkSource for StaticLinkSource {
    async fn magnet_links(&self, url: &str) -> anyhow::Result<Vec<MagnetLink>> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        self.links
            .clone()
            .ok_or_else(|| anyhow!("page fetch failed for {url}"))
    }
}
