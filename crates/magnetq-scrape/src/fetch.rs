//! HTTP retrieval of listing pages.

use std::time::Duration;

use async_trait::async_trait;
use magnetq_core::{LinkSource, MagnetLink};
use reqwest::Client;
use tracing::{info, instrument};

use crate::error::{ScrapeError, ScrapeResult};
use crate::extract::AnchorExtractor;

/// Fetches a page and extracts its magnet links.
#[derive(Debug, Clone)]
pub struct PageScraper {
    http: Client,
    extractor: AnchorExtractor,
}

impl PageScraper {
    /// Build a scraper whose page requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::ClientBuild`] or [`ScrapeError::Selector`]
    /// when setup fails.
    pub fn new(timeout: Duration) -> ScrapeResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ScrapeError::ClientBuild { source })?;
        Ok(Self {
            http,
            extractor: AnchorExtractor::new()?,
        })
    }

    /// Download `url` and return the body text.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Fetch`] on transport failures and
    /// [`ScrapeError::Status`] on non-success responses.
    pub async fn fetch(&self, url: &str) -> ScrapeResult<String> {
        let fetch_error = |source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        };
        let response = self.http.get(url).send().await.map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(fetch_error)
    }

    /// Fetch `url` and extract its magnet links in page order.
    ///
    /// # Errors
    ///
    /// Propagates [`PageScraper::fetch`] failures.
    #[instrument(name = "scrape.page", skip(self))]
    pub async fn scrape(&self, url: &str) -> ScrapeResult<Vec<MagnetLink>> {
        let html = self.fetch(url).await?;
        let links = self.extractor.magnet_links(&html);
        info!(count = links.len(), "extracted magnet links");
        Ok(links)
    }
}

#[async_trait]
impl LinkSource for PageScraper {
    async fn magnet_links(&self, url: &str) -> anyhow::Result<Vec<MagnetLink>> {
        Ok(self.scrape(url).await?)
    }
}
