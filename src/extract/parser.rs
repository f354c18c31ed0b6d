//! Quote listing parser
//!
//! Turns one listing page into its quote records plus an optional request for
//! the next listing page.
//!
//! # Next-link scoping
//!
//! Record extraction and next-link lookup are independent steps. With
//! [`NextLinkScope::Page`] the next link is found anywhere in the page, even
//! when the page has no quote cards. [`NextLinkScope::LastRecord`] anchors the
//! lookup to the last quote card instead; a page without cards then fails with
//! [`ExtractError::MissingElement`]. An absent next link is never an error.

use crate::config::SelectorConfig;
use crate::extract::page::{all_texts, first_text, Page};
use crate::extract::record::QuoteRecord;
use crate::extract::selectors::SelectorSet;
use crate::ExtractError;
use scraper::ElementRef;
use serde::Deserialize;
use url::Url;

/// How the next-page lookup is scoped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NextLinkScope {
    /// Look up the next link across the whole page
    #[default]
    Page,

    /// Require a quote card to anchor the lookup; pages without cards fail
    LastRecord,
}

/// Which handler a follow-up response is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    /// Parse the response as another quote listing
    Parse,
}

/// A request to fetch another page, emitted by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRequest {
    /// Raw link target exactly as it appeared in the page
    pub target: String,

    /// Handler for the fetched response
    pub callback: Callback,
}

impl FollowRequest {
    /// Creates a follow-up request routed back to the quote parser
    pub fn parse(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            callback: Callback::Parse,
        }
    }

    /// Resolves the raw target against the URL of the page that emitted it
    pub fn resolve(&self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(&self.target)
    }
}

/// Result of parsing one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// One record per quote card, in document order
    pub records: Vec<QuoteRecord>,

    /// Request for the next listing page, if the page links to one
    pub next: Option<FollowRequest>,
}

/// Extracts quote records and the next-page link from listing pages
#[derive(Debug, Clone)]
pub struct QuoteParser {
    selectors: SelectorSet,
    scope: NextLinkScope,
}

impl QuoteParser {
    /// Creates a parser from compiled selectors
    pub fn new(selectors: SelectorSet, scope: NextLinkScope) -> Self {
        Self { selectors, scope }
    }

    /// Creates a parser by compiling the configured selectors
    pub fn from_config(config: &SelectorConfig, scope: NextLinkScope) -> Result<Self, ExtractError> {
        Ok(Self::new(SelectorSet::from_config(config)?, scope))
    }

    /// Returns the next-link scoping in effect
    pub fn scope(&self) -> NextLinkScope {
        self.scope
    }

    /// Parses one listing page
    ///
    /// # Returns
    ///
    /// * `Ok(ParseOutcome)` - Records in document order and the optional follow-up
    /// * `Err(ExtractError::MissingElement)` - Only with [`NextLinkScope::LastRecord`]
    ///   on a page without quote cards
    pub fn parse(&self, page: &Page) -> Result<ParseOutcome, ExtractError> {
        let cards: Vec<ElementRef<'_>> = page.select(&self.selectors.quote).collect();

        let records: Vec<QuoteRecord> = cards.iter().map(|card| self.extract_record(*card)).collect();

        let next_link = match self.scope {
            NextLinkScope::Page => self.extract_next_link(page),
            NextLinkScope::LastRecord => {
                if cards.last().is_none() {
                    return Err(ExtractError::MissingElement {
                        what: "quote card anchoring the next-page lookup",
                        url: page.url().to_string(),
                    });
                }
                self.extract_next_link(page)
            }
        };

        tracing::trace!(
            "Parsed {}: {} records, next link {:?}",
            page.url(),
            records.len(),
            next_link
        );

        Ok(ParseOutcome {
            records,
            next: next_link.map(FollowRequest::parse),
        })
    }

    /// Extracts a single record from a quote card
    ///
    /// Each field is looked up on its own; a missing element only blanks that field.
    pub fn extract_record(&self, card: ElementRef<'_>) -> QuoteRecord {
        QuoteRecord {
            text: first_text(card, &self.selectors.text),
            author: first_text(card, &self.selectors.author),
            tags: all_texts(card, &self.selectors.tags),
        }
    }

    /// Reads the raw `href` of the next-page link, searching the whole page
    pub fn extract_next_link(&self, page: &Page) -> Option<String> {
        page.first_attr(&self.selectors.next_link, "href")
    }
}

/// Parses an HTML body served from `url`
///
/// The DOM is built and dropped inside this call, so the returned outcome can
/// be carried across `.await` points.
pub fn parse_html(parser: &QuoteParser, url: &Url, html: &str) -> Result<ParseOutcome, ExtractError> {
    let page = Page::new(url.clone(), html);
    parser.parse(&page)
}
