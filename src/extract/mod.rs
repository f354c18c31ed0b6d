//! Quote extraction from listing pages
//!
//! This is the page-parsing core of the spider. Given one fetched page it
//! returns the quote records found on it and, when the page links to a
//! following listing page, a request to continue the crawl.
//!
//! Nothing in here performs I/O. Fetching, scheduling, and storing records are
//! handled by the crawler and output modules.
//!
//! # Example
//!
//! ```
//! use quotes_spider::config::SelectorConfig;
//! use quotes_spider::extract::{parse_html, NextLinkScope, QuoteParser};
//! use url::Url;
//!
//! let parser = QuoteParser::from_config(&SelectorConfig::default(), NextLinkScope::Page).unwrap();
//! let html = r#"<div class="quote"><span class="text">Hi</span></div>
//!               <li class="next"><a href="/page/2/">Next</a></li>"#;
//! let url = Url::parse("http://quotes.toscrape.com/page/1/").unwrap();
//!
//! let outcome = parse_html(&parser, &url, html).unwrap();
//! assert_eq!(outcome.records.len(), 1);
//! assert_eq!(outcome.next.unwrap().target, "/page/2/");
//! ```

mod page;
mod parser;
mod record;
mod selectors;

pub use page::{all_texts, first_text, text_of, Page};
pub use parser::{parse_html, Callback, FollowRequest, NextLinkScope, ParseOutcome, QuoteParser};
pub use record::QuoteRecord;
pub use selectors::{compile_selector, SelectorSet};
