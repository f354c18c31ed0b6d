//! URL handling module for Quotes-Spider
//!
//! This module provides URL canonicalization for the duplicate filter, domain
//! extraction, and the allowed-domains (offsite) check.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_wildcard;
pub use normalize::canonicalize_url;

/// Checks whether a domain may be visited under the `allowed-domains` list
///
/// An empty list allows every domain. Otherwise the domain must match at
/// least one entry, either exactly or through a `*.` wildcard pattern.
///
/// # Examples
///
/// ```
/// use quotes_spider::url::is_allowed_domain;
///
/// let allowed = vec!["quotes.toscrape.com".to_string()];
/// assert!(is_allowed_domain("quotes.toscrape.com", &allowed));
/// assert!(!is_allowed_domain("example.com", &allowed));
/// assert!(is_allowed_domain("example.com", &[]));
/// ```
pub fn is_allowed_domain(domain: &str, allowed_domains: &[String]) -> bool {
    if allowed_domains.is_empty() {
        return true;
    }

    let domain = domain.to_lowercase();
    allowed_domains
        .iter()
        .any(|pattern| matches_wildcard(&pattern.to_lowercase(), &domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_empty_list_allows_everything() {
        assert!(is_allowed_domain("quotes.toscrape.com", &[]));
        assert!(is_allowed_domain("anything.example", &[]));
    }

    #[test]
    fn test_exact_entry() {
        let list = allowed(&["quotes.toscrape.com"]);
        assert!(is_allowed_domain("quotes.toscrape.com", &list));
        assert!(!is_allowed_domain("toscrape.com", &list));
        assert!(!is_allowed_domain("books.toscrape.com", &list));
    }

    #[test]
    fn test_wildcard_entry() {
        let list = allowed(&["*.toscrape.com"]);
        assert!(is_allowed_domain("toscrape.com", &list));
        assert!(is_allowed_domain("quotes.toscrape.com", &list));
        assert!(!is_allowed_domain("toscrape.org", &list));
    }

    #[test]
    fn test_any_entry_may_match() {
        let list = allowed(&["example.com", "quotes.toscrape.com"]);
        assert!(is_allowed_domain("quotes.toscrape.com", &list));
        assert!(is_allowed_domain("example.com", &list));
        assert!(!is_allowed_domain("example.org", &list));
    }

    #[test]
    fn test_case_insensitive() {
        let list = allowed(&["Quotes.ToScrape.com"]);
        assert!(is_allowed_domain("QUOTES.toscrape.COM", &list));
    }
}
