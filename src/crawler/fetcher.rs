//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the crawler's user agent
//! - GET requests with retries for transient failures
//! - Mapping failures to page states

use crate::config::{Config, SpiderConfig};
use crate::state::PageState;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for one request
pub const MAX_REDIRECTS: usize = 10;

const TIMEOUT_MESSAGE: &str = "Request timeout";

/// Status codes worth another attempt
pub const RETRY_HTTP_CODES: [u16; 8] = [408, 429, 500, 502, 503, 504, 522, 524];

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// HTTP status code
        status_code: u16,
        /// The actual Content-Type received
        content_type: String,
    },

    /// HTTP error that maps to a specific page state
    HttpError {
        /// The HTTP status code
        status_code: u16,
        /// The page state this error maps to
        state: PageState,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// The page state this error maps to
        state: PageState,
    },
}

/// How a response status is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx, the body is used
    Success,
    /// Worth retrying; `exhausted` is the state once retries run out
    Retryable { exhausted: PageState },
    /// Final, no retry
    Terminal(PageState),
}

/// Classifies an HTTP status code
pub fn classify_status(status_code: u16) -> StatusClass {
    match status_code {
        200..=299 => StatusClass::Success,
        404 | 410 => StatusClass::Terminal(PageState::DeadLink),
        429 => StatusClass::Retryable {
            exhausted: PageState::RateLimited,
        },
        code if RETRY_HTTP_CODES.contains(&code) => StatusClass::Retryable {
            exhausted: PageState::Failed,
        },
        _ => StatusClass::Terminal(PageState::Failed),
    }
}

/// Returns whether a Content-Type header names an HTML document
///
/// A missing header is given the benefit of the doubt.
pub fn is_html_content_type(content_type: &str) -> bool {
    if content_type.trim().is_empty() {
        return true;
    }
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Retry settings for transient fetch failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retry_times: u32,
    /// Pause between attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SpiderConfig) -> Self {
        Self {
            retry_times: config.retry_times,
            backoff: Duration::from_millis(config.retry_backoff),
        }
    }

    /// Total number of attempts, the first one included
    pub fn max_attempts(&self) -> u32 {
        self.retry_times + 1
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use quotes_spider::config::load_config;
/// use quotes_spider::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("quotes.toml")).unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(Duration::from_secs(config.spider.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with error handling and retry logic
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 404, 410 | Immediate → DeadLink |
/// | HTTP 429 | Retry, then → RateLimited |
/// | HTTP 408, 5xx listed in `RETRY_HTTP_CODES` | Retry, then → Failed |
/// | Other non-2xx | Immediate → Failed |
/// | Timeout | Retry, then → Failed |
/// | Connection refused, DNS, TLS | Immediate → Unreachable |
/// | Too many redirects | Immediate → Failed |
/// | Non-HTML Content-Type | Immediate → ContentMismatch |
pub async fn fetch_url(client: &Client, url: &Url, policy: &RetryPolicy) -> FetchResult {
    let mut attempt = 1;

    loop {
        let result = fetch_once(client, url).await;

        let retry = match &result {
            FetchResult::HttpError { status_code, .. } => {
                matches!(classify_status(*status_code), StatusClass::Retryable { .. })
            }
            FetchResult::NetworkError { .. } => is_timeout(&result),
            _ => false,
        };

        if !retry || attempt >= policy.max_attempts() {
            return result;
        }

        tracing::debug!(
            "Attempt {}/{} for {} failed ({}), retrying in {:?}",
            attempt,
            policy.max_attempts(),
            url,
            describe(&result),
            policy.backoff
        );
        attempt += 1;
        tokio::time::sleep(policy.backoff).await;
    }
}

fn is_timeout(result: &FetchResult) -> bool {
    matches!(result, FetchResult::NetworkError { error, .. } if error == TIMEOUT_MESSAGE)
}

fn describe(result: &FetchResult) -> String {
    match result {
        FetchResult::HttpError { status_code, .. } => format!("HTTP {}", status_code),
        FetchResult::NetworkError { error, .. } => error.clone(),
        FetchResult::ContentMismatch { content_type, .. } => content_type.clone(),
        FetchResult::Success { status_code, .. } => format!("HTTP {}", status_code),
    }
}

/// Performs a single GET request and classifies the outcome
async fn fetch_once(client: &Client, url: &Url) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status_code = response.status().as_u16();
    match classify_status(status_code) {
        StatusClass::Success => {}
        StatusClass::Retryable { exhausted: state } | StatusClass::Terminal(state) => {
            return FetchResult::HttpError { status_code, state };
        }
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch {
            status_code,
            content_type,
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code,
            content_type,
            body,
        },
        Err(e) => classify_error(&e),
    }
}

/// Maps a reqwest error to a page state
fn classify_error(e: &reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: TIMEOUT_MESSAGE.to_string(),
            state: PageState::Failed,
        }
    } else if e.is_redirect() {
        FetchResult::NetworkError {
            error: format!("Redirect error: {}", e),
            state: PageState::Failed,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
            state: PageState::Unreachable,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            state: PageState::Failed,
        }
    }
}
