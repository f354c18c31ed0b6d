//! Robots.txt cache entry with 24-hour expiry

use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};

/// How long a fetched robots.txt stays valid
const ROBOTS_TTL_HOURS: i64 = 24;

/// Parsed robots.txt for one domain plus when it was fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub robots: ParsedRobots,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Creates a cache entry stamped with the current time
    pub fn new(robots: ParsedRobots) -> Self {
        Self {
            robots,
            fetched_at: Utc::now(),
        }
    }

    /// Returns true once the entry is older than 24 hours
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(ROBOTS_TTL_HOURS)
    }

    /// Time since the robots.txt was fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_is_fresh() {
        let cache = CachedRobots::new(ParsedRobots::allow_all());
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_entry_goes_stale_after_a_day() {
        let mut cache = CachedRobots::new(ParsedRobots::allow_all());

        cache.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!cache.is_stale());

        cache.fetched_at = Utc::now() - Duration::hours(25);
        assert!(cache.is_stale());
    }

    #[test]
    fn test_age() {
        let mut cache = CachedRobots::new(ParsedRobots::allow_all());
        cache.fetched_at = Utc::now() - Duration::hours(12);

        let age = cache.age();
        assert!(age.num_hours() >= 11 && age.num_hours() <= 13);
    }
}
