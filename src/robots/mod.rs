//! Robots.txt handling module
//!
//! Fetches, parses, and caches robots.txt files so the crawler can skip
//! disallowed pages and honour `Crawl-delay`.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::ParsedRobots;

use reqwest::Client;
use url::Url;

/// Returns the robots.txt URL for the origin of `page_url`
pub fn robots_url(page_url: &Url) -> Result<Url, url::ParseError> {
    page_url.join("/robots.txt")
}

/// Fetches and parses robots.txt for the origin of `page_url`
///
/// A missing file, an error status, or a network failure all yield
/// [`ParsedRobots::allow_all`]; robots.txt problems never stop a crawl.
pub async fn fetch_robots(client: &Client, page_url: &Url) -> ParsedRobots {
    let url = match robots_url(page_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL for {}: {}", page_url, e);
            return ParsedRobots::allow_all();
        }
    };

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!("{} returned HTTP {}, allowing all", url, response.status());
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::debug!("Fetched {} ({} bytes)", url, body.len());
            ParsedRobots::from_content(&body)
        }
        Err(e) => {
            tracing::debug!("Failed to read {}: {}", url, e);
            ParsedRobots::allow_all()
        }
    }
}
