// src/services/links.rs

//! Schedule link discovery.
//!
//! Finds the document links published under a building's heading on the
//! schedule listing page.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Corpus, SiteConfig};
use crate::utils::{has_extension, resolve_url};

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// Extracts per-building document links from a listing page.
#[derive(Debug, Clone)]
pub struct LinkDiscovery {
    base_url: Url,
    extension: String,
    heading_selector: Selector,
    link_selector: Selector,
}

impl LinkDiscovery {
    /// Create a discovery service resolving links against `base_url`.
    pub fn new(base_url: Url, extension: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url,
            extension: extension.into(),
            heading_selector: parse_selector(HEADING_SELECTOR)?,
            link_selector: parse_selector("a[href]")?,
        })
    }

    /// Create a discovery service from site configuration.
    pub fn from_site(site: &SiteConfig) -> Result<Self> {
        Self::new(Url::parse(&site.base_url)?, site.document_extension.clone())
    }

    /// Parse raw listing HTML and discover links for `corpus`.
    pub fn discover_html(&self, html: &str, corpus: Corpus) -> Vec<String> {
        let document = Html::parse_document(html);
        self.discover(&document, corpus)
    }

    /// Discover document links for `corpus`.
    ///
    /// Returns an empty list when the building heading or the block after it
    /// is missing.
    pub fn discover(&self, document: &Html, corpus: Corpus) -> Vec<String> {
        let keyword = corpus.profile().heading_keyword;

        let Some(heading) = document.select(&self.heading_selector).find(|h| {
            h.text()
                .collect::<String>()
                .to_lowercase()
                .contains(keyword)
        }) else {
            log::warn!("No heading found for {} corpus", corpus);
            return Vec::new();
        };

        let Some(block) = heading.next_siblings().find_map(ElementRef::wrap) else {
            log::warn!("No link block after heading for {} corpus", corpus);
            return Vec::new();
        };

        let mut links: Vec<String> = Vec::new();
        for anchor in block.select(&self.link_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if !has_extension(href, &self.extension) {
                continue;
            }
            let url = resolve_url(&self.base_url, href);
            if !links.contains(&url) {
                links.push(url);
            }
        }

        log::debug!("Found {} link(s) for {} corpus", links.len(), corpus);
        links
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::discovery(format!("invalid selector '{s}': {e:?}")))
}
