//! Fetched page wrapper with structural query helpers

use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A fetched HTML document together with the URL it was served from
///
/// The URL is the final one after redirects, so relative links found on the
/// page resolve against it.
///
/// `Page` owns a parsed DOM, which is not `Send`. Build it, query it, and drop
/// it before yielding to the runtime.
pub struct Page {
    url: Url,
    document: Html,
}

impl Page {
    /// Parses `html` as a full document served from `url`
    pub fn new(url: Url, html: &str) -> Self {
        Self {
            url,
            document: Html::parse_document(html),
        }
    }

    /// The URL this page was served from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Selects every element matching `selector`, in document order
    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.document.select(selector)
    }

    /// Reads `attr` from the first element matching `selector` anywhere in the page
    pub fn first_attr(&self, selector: &Selector, attr: &str) -> Option<String> {
        self.document
            .select(selector)
            .next()
            .and_then(|element| element.value().attr(attr))
            .map(|value| value.to_string())
    }
}

/// Returns the concatenated text content of an element, untrimmed
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Text content of the first descendant of `scope` matching `selector`
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(text_of)
}

/// Text content of every descendant of `scope` matching `selector`
pub fn all_texts(scope: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    scope.select(selector).map(text_of).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> Page {
        Page::new(Url::parse("https://example.com/list/").unwrap(), html)
    }

    #[test]
    fn test_url_is_kept() {
        let page = page("<p>hi</p>");
        assert_eq!(page.url().as_str(), "https://example.com/list/");
    }

    #[test]
    fn test_first_attr() {
        let page = page(r#"<a class="x" href="/one">1</a><a class="x" href="/two">2</a>"#);
        let selector = Selector::parse("a.x").unwrap();
        assert_eq!(page.first_attr(&selector, "href"), Some("/one".to_string()));
        assert_eq!(page.first_attr(&selector, "title"), None);
    }

    #[test]
    fn test_text_is_not_trimmed() {
        let page = page("<div><span class=\"t\">  padded <b>bold</b> </span></div>");
        let div = Selector::parse("div").unwrap();
        let span = Selector::parse("span.t").unwrap();
        let scope = page.select(&div).next().unwrap();
        assert_eq!(
            first_text(scope, &span),
            Some("  padded bold ".to_string())
        );
    }

    #[test]
    fn test_all_texts_in_order() {
        let page = page("<ul><li>a</li><li>b</li><li>c</li></ul>");
        let ul = Selector::parse("ul").unwrap();
        let li = Selector::parse("li").unwrap();
        let scope = page.select(&ul).next().unwrap();
        assert_eq!(all_texts(scope, &li), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_first_text_missing() {
        let page = page("<div></div>");
        let div = Selector::parse("div").unwrap();
        let span = Selector::parse("span").unwrap();
        let scope = page.select(&div).next().unwrap();
        assert_eq!(first_text(scope, &span), None);
    }
}
