//! Scheduler for managing the crawl frontier and politeness
//!
//! This module handles:
//! - The FIFO frontier of requests waiting to be fetched
//! - Filtering duplicate requests by canonical URL
//! - The page cap, counted in pages actually fetched
//! - Per-domain spacing between requests, including robots.txt crawl delays

use crate::config::SpiderConfig;
use crate::state::DomainState;
use crate::url::canonicalize_url;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};
use url::Url;

/// A request waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedRequest {
    /// The URL to fetch
    pub url: Url,

    /// The domain of this URL
    pub domain: String,

    /// Pages followed from the start URL to reach this one
    pub depth: u32,

    /// Page the request was found on
    pub referer: Option<String>,

    /// Database page ID
    pub page_id: i64,
}

/// What the scheduler hands out next
#[derive(Debug)]
pub enum Scheduled {
    /// The domain is ready; fetch it
    Ready(QueuedRequest),

    /// The domain has rate limited the crawler; skip it
    RateLimited(QueuedRequest),
}

/// Scheduler manages the frontier queue and per-domain timing
pub struct Scheduler {
    /// Per-domain state tracking
    domain_states: HashMap<String, DomainState>,

    /// Requests in the order they were enqueued
    frontier: VecDeque<QueuedRequest>,

    /// Canonical forms of every URL ever admitted
    seen: HashSet<String>,

    /// Minimum spacing between requests to one domain
    download_delay: Duration,

    /// Agent token used to look up robots.txt crawl delays
    agent: String,

    /// Maximum number of pages to fetch (0 means unlimited)
    max_pages: u32,

    fetched: u32,
    duplicates_filtered: u64,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - The spider configuration
    /// * `agent` - The crawler's robots.txt agent token
    pub fn new(config: &SpiderConfig, agent: &str) -> Self {
        Self {
            domain_states: HashMap::new(),
            frontier: VecDeque::new(),
            seen: HashSet::new(),
            download_delay: Duration::from_millis(config.download_delay),
            agent: agent.to_string(),
            max_pages: config.max_pages,
            fetched: 0,
            duplicates_filtered: 0,
        }
    }

    /// Registers a URL with the duplicate filter
    ///
    /// Returns false when the canonical form was seen before (the duplicate is
    /// counted) or when the URL cannot be canonicalized.
    pub fn admit(&mut self, url: &Url) -> bool {
        let canonical = match canonicalize_url(url.as_str()) {
            Ok(canonical) => canonical,
            Err(e) => {
                tracing::debug!("Dropping {}: {}", url, e);
                return false;
            }
        };

        if self.seen.insert(canonical.to_string()) {
            true
        } else {
            tracing::debug!("Filtered duplicate request: {}", url);
            self.duplicates_filtered += 1;
            false
        }
    }

    /// Adds an admitted request to the back of the frontier
    pub fn enqueue(&mut self, request: QueuedRequest) {
        self.frontier.push_back(request);
    }

    /// Gets the next request to process
    ///
    /// Returns None when the frontier is empty or the page cap is reached.
    /// Otherwise sleeps until the request's domain may be contacted again.
    /// Requests that end up not being fetched (robots.txt denial, rate-limit
    /// skips) leave the cap untouched.
    pub async fn next_request(&mut self) -> Option<Scheduled> {
        if self.cap_reached() {
            if !self.frontier.is_empty() {
                tracing::info!(
                    "Page limit of {} reached, {} requests left unfetched",
                    self.max_pages,
                    self.frontier.len()
                );
            }
            return None;
        }

        let request = self.frontier.pop_front()?;
        let state = self
            .domain_states
            .entry(request.domain.clone())
            .or_insert_with(DomainState::new);

        if state.rate_limited {
            return Some(Scheduled::RateLimited(request));
        }

        let delay = state.effective_delay(self.download_delay, &self.agent);
        let wait = state.time_until_next_request(delay, Instant::now());
        if let Some(wait) = wait {
            tracing::debug!("Waiting {:?} before contacting {}", wait, request.domain);
            tokio::time::sleep(wait).await;
        }

        Some(Scheduled::Ready(request))
    }

    fn cap_reached(&self) -> bool {
        self.max_pages > 0 && self.fetched >= self.max_pages
    }

    /// Records that a page fetch was sent to a domain
    ///
    /// Counts toward the page cap.
    pub fn record_request(&mut self, domain: &str) {
        self.fetched += 1;
        self.domain_state_mut(domain).record_request(Instant::now());
    }

    /// Marks a domain as rate limited
    pub fn mark_rate_limited(&mut self, domain: &str) {
        self.domain_state_mut(domain).mark_rate_limited();
    }

    /// Gets the state of a domain, creating it on first use
    pub fn domain_state_mut(&mut self, domain: &str) -> &mut DomainState {
        self.domain_states
            .entry(domain.to_string())
            .or_insert_with(DomainState::new)
    }

    /// Returns the number of requests in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Number of requests dropped by the duplicate filter
    pub fn duplicates_filtered(&self) -> u64 {
        self.duplicates_filtered
    }

    /// Number of page fetches recorded so far
    pub fn fetched(&self) -> u32 {
        self.fetched
    }
}
