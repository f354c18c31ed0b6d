/// Checks if a domain matches an `allowed-domains` pattern
///
/// A plain pattern such as `quotes.toscrape.com` matches only that domain.
/// A pattern starting with `*.` matches the bare base domain and every
/// subdomain below it, at any depth.
///
/// Both sides are expected in lowercase already.
///
/// # Examples
///
/// ```
/// use quotes_spider::url::matches_wildcard;
///
/// assert!(matches_wildcard("quotes.toscrape.com", "quotes.toscrape.com"));
/// assert!(!matches_wildcard("quotes.toscrape.com", "toscrape.com"));
///
/// assert!(matches_wildcard("*.toscrape.com", "toscrape.com"));
/// assert!(matches_wildcard("*.toscrape.com", "quotes.toscrape.com"));
/// assert!(!matches_wildcard("*.toscrape.com", "nottoscrape.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}
