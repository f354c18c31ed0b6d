use crate::UrlError;
use url::Url;

/// Builds the canonical form of a URL used by the duplicate filter
///
/// Two requests are duplicates when their canonical forms are equal.
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than HTTP and HTTPS
/// 3. Lowercase the host
/// 4. Remove the fragment
/// 5. Sort query parameters by key (stable, so repeated keys keep their order)
/// 6. Remove an empty query string
///
/// The path is left as the server sent it, trailing slash included, since
/// `/page/1` and `/page/1/` can be different resources.
///
/// # Examples
///
/// ```
/// use quotes_spider::url::canonicalize_url;
///
/// let url = canonicalize_url("http://Quotes.ToScrape.com/page/2/?b=2&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "http://quotes.toscrape.com/page/2/?a=1&b=2");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // The url crate already lowercases registered domain names on parse
    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    url.set_fragment(None);

    if url.query().is_some() {
        let params = sorted_query_pairs(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Returns the non-empty query pairs sorted by key
fn sorted_query_pairs(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, value)| !(key.is_empty() && value.is_empty()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_scheme() {
        let result = canonicalize_url("http://quotes.toscrape.com/page/1/").unwrap();
        assert_eq!(result.as_str(), "http://quotes.toscrape.com/page/1/");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = canonicalize_url("http://QUOTES.toscrape.COM/Page/1/").unwrap();
        assert_eq!(result.as_str(), "http://quotes.toscrape.com/Page/1/");
    }

    #[test]
    fn test_trailing_slash_preserved() {
        let with = canonicalize_url("http://quotes.toscrape.com/page/1/").unwrap();
        let without = canonicalize_url("http://quotes.toscrape.com/page/1").unwrap();
        assert_ne!(with, without);
    }

    #[test]
    fn test_remove_fragment() {
        let result = canonicalize_url("http://quotes.toscrape.com/page/1/#quotes").unwrap();
        assert_eq!(result.as_str(), "http://quotes.toscrape.com/page/1/");
    }

    #[test]
    fn test_sort_query_params() {
        let result = canonicalize_url("http://example.com/search?tag=life&page=2").unwrap();
        assert_eq!(result.as_str(), "http://example.com/search?page=2&tag=life");
    }

    #[test]
    fn test_repeated_keys_keep_relative_order() {
        let result = canonicalize_url("http://example.com/?t=b&a=1&t=a").unwrap();
        assert_eq!(result.as_str(), "http://example.com/?a=1&t=b&t=a");
    }

    #[test]
    fn test_empty_query_removed() {
        let result = canonicalize_url("http://example.com/page/1/?").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page/1/");
    }

    #[test]
    fn test_equivalent_urls_are_equal() {
        let a = canonicalize_url("http://Example.com/page/2/?b=2&a=1#x").unwrap();
        let b = canonicalize_url("http://example.com/page/2/?a=1&b=2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dot_segments_resolved_by_parser() {
        let result = canonicalize_url("http://example.com/page/../page/2/").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page/2/");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = canonicalize_url("ftp://example.com/page");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(canonicalize_url("not a url"), Err(UrlError::Parse(_))));
        assert!(matches!(canonicalize_url("/page/2/"), Err(UrlError::Parse(_))));
    }
}
