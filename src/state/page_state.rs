/// Page state definitions for tracking crawl progress
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Page is queued and waiting to be fetched
    Queued,

    /// Page is currently being fetched
    Fetching,

    // ===== Terminal Success States =====
    /// Page was fetched and run through the quote parser
    Parsed,

    // ===== Terminal Error States =====
    /// Page returned HTTP 404 or 410
    DeadLink,

    /// Page could not be reached (connection refused, DNS failure, TLS error)
    Unreachable,

    /// Page returned HTTP 429 after all retries, or its domain is rate limited
    RateLimited,

    /// Fetch or extraction failed for any other reason
    Failed,

    /// Page Content-Type is not HTML
    ContentMismatch,

    /// robots.txt disallows the page; it was never fetched
    RobotsDenied,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Fetching)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::DeadLink
                | Self::Unreachable
                | Self::RateLimited
                | Self::Failed
                | Self::ContentMismatch
        )
    }

    /// Converts the page state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Parsed => "parsed",
            Self::DeadLink => "dead_link",
            Self::Unreachable => "unreachable",
            Self::RateLimited => "rate_limited",
            Self::Failed => "failed",
            Self::ContentMismatch => "content_mismatch",
            Self::RobotsDenied => "robots_denied",
        }
    }

    /// Parses a page state from its database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "fetching" => Some(Self::Fetching),
            "parsed" => Some(Self::Parsed),
            "dead_link" => Some(Self::DeadLink),
            "unreachable" => Some(Self::Unreachable),
            "rate_limited" => Some(Self::RateLimited),
            "failed" => Some(Self::Failed),
            "content_mismatch" => Some(Self::ContentMismatch),
            "robots_denied" => Some(Self::RobotsDenied),
            _ => None,
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Fetching,
            Self::Parsed,
            Self::DeadLink,
            Self::Unreachable,
            Self::RateLimited,
            Self::Failed,
            Self::ContentMismatch,
            Self::RobotsDenied,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_and_terminal() {
        assert!(PageState::Queued.is_active());
        assert!(PageState::Fetching.is_active());

        for state in PageState::all_states() {
            assert_ne!(state.is_active(), state.is_terminal(), "{:?}", state);
        }
    }

    #[test]
    fn test_is_error() {
        assert!(PageState::DeadLink.is_error());
        assert!(PageState::Unreachable.is_error());
        assert!(PageState::RateLimited.is_error());
        assert!(PageState::Failed.is_error());
        assert!(PageState::ContentMismatch.is_error());

        // Skipped on purpose, not a failure
        assert!(!PageState::RobotsDenied.is_error());
        assert!(!PageState::Parsed.is_error());
        assert!(!PageState::Queued.is_error());
    }

    #[test]
    fn test_db_strings() {
        assert_eq!(PageState::Parsed.to_db_string(), "parsed");
        assert_eq!(PageState::DeadLink.to_db_string(), "dead_link");
        assert_eq!(PageState::RobotsDenied.to_db_string(), "robots_denied");
        assert_eq!(
            PageState::from_db_string("content_mismatch"),
            Some(PageState::ContentMismatch)
        );
        assert_eq!(PageState::from_db_string("processed"), None);
    }

    #[test]
    fn test_roundtrip_db_string() {
        for state in PageState::all_states() {
            let parsed = PageState::from_db_string(state.to_db_string());
            assert_eq!(Some(state), parsed, "Failed roundtrip for {:?}", state);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PageState::Queued), "queued");
        assert_eq!(format!("{}", PageState::RateLimited), "rate_limited");
    }
}
