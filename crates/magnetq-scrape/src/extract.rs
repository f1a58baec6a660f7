//! Anchor `href` extraction.

use magnetq_core::{MagnetLink, model::MAGNET_SCHEME};
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::{ScrapeError, ScrapeResult};

const ANCHOR_HREF: &str = "a[href]";

/// Pulls magnet links out of anchor elements in an HTML document.
///
/// Pages are parsed as HTML5, so attribute values arrive with character
/// references decoded and commented-out markup is never seen.
#[derive(Debug, Clone)]
pub struct AnchorExtractor {
    anchor: Selector,
}

impl AnchorExtractor {
    /// Parse the anchor selector.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Selector`] if the selector is rejected.
    pub fn new() -> ScrapeResult<Self> {
        let anchor = Selector::parse(ANCHOR_HREF).map_err(|err| ScrapeError::Selector {
            selector: ANCHOR_HREF,
            reason: err.to_string(),
        })?;
        Ok(Self { anchor })
    }

    /// Every anchor `href` in document order, trimmed.
    #[must_use]
    pub fn hrefs(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.anchor)
            .filter_map(|anchor| anchor.value().attr("href"))
            .map(|href| href.trim().to_string())
            .collect()
    }

    /// Magnet links in document order. Duplicates are kept; non-magnet
    /// anchors are skipped.
    #[must_use]
    pub fn magnet_links(&self, html: &str) -> Vec<MagnetLink> {
        let hrefs = self.hrefs(html);
        let total = hrefs.len();
        let links: Vec<MagnetLink> = hrefs
            .into_iter()
            .filter(|href| href.starts_with(MAGNET_SCHEME))
            .filter_map(|href| MagnetLink::parse(href).ok())
            .collect();
        debug!(anchors = total, magnets = links.len(), "scanned listing page");
        links
    }
}

/// Extract the magnet links of `html` with a fresh [`AnchorExtractor`].
///
/// # Errors
///
/// Returns [`ScrapeError::Selector`] if the anchor selector is rejected.
pub fn extract_magnet_links(html: &str) -> ScrapeResult<Vec<MagnetLink>> {
    Ok(AnchorExtractor::new()?.magnet_links(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> AnchorExtractor {
        AnchorExtractor::new().expect("anchor selector parses")
    }

    fn links(html: &str) -> Vec<String> {
        extractor()
            .magnet_links(html)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn keeps_magnets_in_page_order() {
        let html = r#"
            <ul>
              <li><a href="magnet:?xt=urn:btih:aaa">one</a></li>
              <li><a class="dl" href="https://example.test/file.torrent">torrent</a></li>
              <li><A HREF='magnet:?xt=urn:btih:bbb'>two</A></li>
              <li><a href=magnet:?xt=urn:btih:ccc>three</a></li>
            </ul>"#;
        assert_eq!(
            links(html),
            vec![
                "magnet:?xt=urn:btih:aaa",
                "magnet:?xt=urn:btih:bbb",
                "magnet:?xt=urn:btih:ccc",
            ]
        );
    }

    #[test]
    fn decodes_character_references_in_href() {
        let html = r#"<a href="magnet:?xt=urn:btih:aaa&amp;dn=Some%20Name&#38;tr=x">x</a>"#;
        assert_eq!(links(html), vec!["magnet:?xt=urn:btih:aaa&dn=Some%20Name&tr=x"]);
    }

    #[test]
    fn decodes_named_references_outside_the_xml_set() {
        let html = r#"<a href="magnet:?xt=urn:btih:real&nbsp;x&eacute;">x</a>"#;
        assert_eq!(links(html), vec!["magnet:?xt=urn:btih:real\u{a0}x\u{e9}"]);
    }

    #[test]
    fn lookalike_attributes_do_not_shadow_href() {
        let html = r#"<a data-href="magnet:?xt=urn:btih:decoy" href="magnet:?xt=urn:btih:real">x</a>
            <a data-href="magnet:?xt=urn:btih:orphan">no href</a>"#;
        assert_eq!(links(html), vec!["magnet:?xt=urn:btih:real"]);
    }

    #[test]
    fn commented_out_anchors_are_ignored() {
        let html = r#"<!-- <a href="magnet:?xt=urn:btih:commented">old</a> -->
            <a href="magnet:?xt=urn:btih:live">new</a>"#;
        assert_eq!(links(html), vec!["magnet:?xt=urn:btih:live"]);
    }

    #[test]
    fn page_without_magnets_yields_nothing() {
        let html = r#"<p>nothing <a href="/about">here</a></p><a name="top">"#;
        assert!(extractor().magnet_links(html).is_empty());
        assert_eq!(extractor().hrefs(html), vec!["/about"]);
    }

    #[test]
    fn duplicate_anchors_are_preserved() {
        let html = r#"<a href="magnet:?xt=urn:btih:aaa">a</a><a href="magnet:?xt=urn:btih:aaa">b</a>"#;
        assert_eq!(extractor().magnet_links(html).len(), 2);
    }

    #[test]
    fn free_function_matches_extractor() {
        let html = r#"<a href="magnet:?xt=urn:btih:aaa">a</a>"#;
        let links = extract_magnet_links(html).expect("selector parses");
        assert_eq!(links, extractor().magnet_links(html));
    }
}
