use crate::extract::NextLinkScope;
use serde::Deserialize;

/// Main configuration structure for Quotes-Spider
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub spider: SpiderConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Config {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn user_agent_string(&self) -> String {
        self.user_agent.header_value()
    }
}

/// Spider behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SpiderConfig {
    /// Spider name, recorded with every run
    pub name: String,

    /// Listing pages the crawl starts from
    #[serde(rename = "start-urls")]
    pub start_urls: Vec<String>,

    /// Domains follow-up requests may visit (empty allows any domain)
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    /// Maximum number of pages to fetch (0 means unlimited)
    #[serde(rename = "max-pages", default)]
    pub max_pages: u32,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "download-delay", default = "default_download_delay")]
    pub download_delay: u64,

    /// Whether robots.txt rules are checked before fetching
    #[serde(rename = "obey-robots", default = "default_true")]
    pub obey_robots: bool,

    /// How the next-page link lookup is scoped
    #[serde(rename = "next-link-scope", default)]
    pub next_link_scope: NextLinkScope,

    /// Extra attempts for transient fetch failures
    #[serde(rename = "retry-times", default = "default_retry_times")]
    pub retry_times: u32,

    /// Pause between fetch attempts (milliseconds)
    #[serde(rename = "retry-backoff", default = "default_retry_backoff")]
    pub retry_backoff: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Optional file that receives every scraped item as it is found
    #[serde(rename = "feed-path", default)]
    pub feed_path: Option<String>,

    /// Serialization used for the feed file
    #[serde(rename = "feed-format", default)]
    pub feed_format: FeedFormat,

    /// Optional markdown summary written when a crawl finishes
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Feed file serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    /// One JSON object per line
    #[default]
    JsonLines,

    /// A single JSON array
    Json,
}

/// CSS selectors for the quote listing markup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Quote card container
    pub quote: String,

    /// Quote text inside a card
    pub text: String,

    /// Author name inside a card
    pub author: String,

    /// Tag anchors inside a card's tags container
    pub tags: String,

    /// Next-page anchor anywhere on the page
    #[serde(rename = "next-link")]
    pub next_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            quote: "div.quote".to_string(),
            text: "span.text".to_string(),
            author: "small.author".to_string(),
            tags: "div.tags a.tag".to_string(),
            next_link: "li.next > a".to_string(),
        }
    }
}

fn default_download_delay() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_retry_times() -> u32 {
    2
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_request_timeout() -> u64 {
    30
}
