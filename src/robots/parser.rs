//! Robots.txt parser implementation
//!
//! Allow/disallow matching is delegated to the robotstxt crate. The crate
//! does not expose `Crawl-delay`, so that directive is read here.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
    /// Set when robots.txt was missing or unreadable
    allow_all: bool,
}

impl ParsedRobots {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used when robots.txt is absent or cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given agent token
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `agent` - The crawler's product token (e.g. "QuotesSpider")
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }

    /// Gets the `Crawl-delay` for an agent, in seconds
    ///
    /// A group naming the agent wins over the `*` group. Consecutive
    /// `User-agent` lines share one group.
    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        if self.allow_all {
            return None;
        }

        let agent = agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_header = false;
        let mut specific = None;
        let mut wildcard = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    if !in_header {
                        group.clear();
                        in_header = true;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_header = false;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|ua| ua == &agent) {
                        specific = specific.or(Some(delay));
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard = wildcard.or(Some(delay));
                    }
                }
                _ => in_header = false,
            }
        }

        specific.or(wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "http://quotes.toscrape.com/page/1/";

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allowed(PAGE, "QuotesSpider"));
        assert_eq!(robots.crawl_delay("QuotesSpider"), None);
    }

    #[test]
    fn test_disallow_everything() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed(PAGE, "QuotesSpider"));
    }

    #[test]
    fn test_disallow_prefix() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /page/2/");
        assert!(robots.is_allowed(PAGE, "QuotesSpider"));
        assert!(!robots.is_allowed(
            "http://quotes.toscrape.com/page/2/",
            "QuotesSpider"
        ));
    }

    #[test]
    fn test_allow_overrides_longer_match() {
        let robots =
            ParsedRobots::from_content("User-agent: *\nDisallow: /page\nAllow: /page/1/");
        assert!(robots.is_allowed(PAGE, "QuotesSpider"));
        assert!(!robots.is_allowed(
            "http://quotes.toscrape.com/page/3/",
            "QuotesSpider"
        ));
    }

    #[test]
    fn test_agent_specific_group() {
        let robots = ParsedRobots::from_content(
            "User-agent: QuotesSpider\nDisallow: /\n\nUser-agent: *\nAllow: /",
        );
        assert!(!robots.is_allowed(PAGE, "QuotesSpider"));
        assert!(robots.is_allowed(PAGE, "OtherBot"));
    }

    #[test]
    fn test_garbage_and_empty_allow() {
        assert!(ParsedRobots::from_content("not a robots file {{{").is_allowed(PAGE, "Bot"));
        assert!(ParsedRobots::from_content("").is_allowed(PAGE, "Bot"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /x");
        assert_eq!(robots.crawl_delay("QuotesSpider"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_specific_wins() {
        let robots = ParsedRobots::from_content(
            "User-agent: *\nCrawl-delay: 10\n\nUser-agent: QuotesSpider\nCrawl-delay: 2.5",
        );
        assert_eq!(robots.crawl_delay("QuotesSpider"), Some(2.5));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_after_disallow_in_group() {
        let robots =
            ParsedRobots::from_content("User-agent: quotesspider\nDisallow: /x\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("QuotesSpider"), Some(3.0));
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let robots =
            ParsedRobots::from_content("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("BotA"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotB"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_new_group_after_rules() {
        let robots = ParsedRobots::from_content(
            "User-agent: BotA\nDisallow: /\nUser-agent: *\nCrawl-delay: 4 # be gentle",
        );
        assert_eq!(robots.crawl_delay("BotA"), Some(4.0));
    }

    #[test]
    fn test_crawl_delay_unparseable() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: soon");
        assert_eq!(robots.crawl_delay("QuotesSpider"), None);
    }
}
