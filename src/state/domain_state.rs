use crate::robots::{CachedRobots, ParsedRobots};
use std::time::{Duration, Instant};

/// Longest robots.txt crawl delay honoured; larger values are clamped
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Tracks the state of a domain during crawling
///
/// Holds what the scheduler needs for politeness: when the domain was last
/// requested, whether it has rate limited us, and its cached robots.txt.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of requests made to this domain in the current crawl
    pub request_count: u32,

    /// Timestamp of the last request to this domain
    pub last_request_time: Option<Instant>,

    /// Whether this domain has been rate limited (HTTP 429)
    pub rate_limited: bool,

    /// Cached robots.txt for this domain
    pub robots: Option<CachedRobots>,
}

impl DomainState {
    /// Creates a new DomainState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was made to this domain
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Marks this domain as rate limited
    pub fn mark_rate_limited(&mut self) {
        self.rate_limited = true;
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, min_delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < min_delay).then(|| min_delay - elapsed)
    }

    /// Returns true when robots.txt has not been fetched or the cache expired
    pub fn needs_robots(&self) -> bool {
        self.robots.as_ref().map_or(true, CachedRobots::is_stale)
    }

    /// Replaces the cached robots.txt
    pub fn update_robots(&mut self, robots: ParsedRobots) {
        self.robots = Some(CachedRobots::new(robots));
    }

    /// Checks a URL against the cached robots.txt; allowed when nothing is cached
    pub fn robots_allows(&self, url: &str, agent: &str) -> bool {
        self.robots
            .as_ref()
            .map_or(true, |cached| cached.robots.is_allowed(url, agent))
    }

    /// Spacing to keep between requests: the larger of `base` and the robots.txt crawl delay
    pub fn effective_delay(&self, base: Duration, agent: &str) -> Duration {
        let robots_delay = self
            .robots
            .as_ref()
            .and_then(|cached| cached.robots.crawl_delay(agent))
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
            .map(clamp_crawl_delay)
            .unwrap_or(Duration::ZERO);

        base.max(robots_delay)
    }
}

fn clamp_crawl_delay(seconds: f64) -> Duration {
    match Duration::try_from_secs_f64(seconds) {
        Ok(delay) if delay <= MAX_CRAWL_DELAY => delay,
        _ => {
            tracing::warn!(
                "Crawl-delay of {}s exceeds {:?}, clamping",
                seconds,
                MAX_CRAWL_DELAY
            );
            MAX_CRAWL_DELAY
        }
    }
}
