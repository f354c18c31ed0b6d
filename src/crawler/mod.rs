//! Crawler module for page fetching and crawl coordination
//!
//! This module contains the host side of the spider:
//! - HTTP fetching with retry logic
//! - Request scheduling, duplicate filtering and politeness delays
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::{crawl, Coordinator, CrawlReport};
pub use fetcher::{
    build_http_client, classify_status, fetch_url, is_html_content_type, FetchResult,
    RetryPolicy, StatusClass, MAX_REDIRECTS, RETRY_HTTP_CODES,
};
pub use scheduler::{QueuedRequest, Scheduled, Scheduler};
