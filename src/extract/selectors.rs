use crate::config::SelectorConfig;
use crate::ExtractError;
use scraper::Selector;

/// Compiled CSS selectors used by the quote parser
#[derive(Debug, Clone)]
pub struct SelectorSet {
    /// Repeated quote card container
    pub quote: Selector,

    /// Quote text, relative to a card
    pub text: Selector,

    /// Author name, relative to a card
    pub author: Selector,

    /// Tag anchors inside the tags container, relative to a card
    pub tags: Selector,

    /// Next-page anchor, looked up across the whole page
    pub next_link: Selector,
}

impl SelectorSet {
    /// Compiles every selector in the configuration
    ///
    /// Fails on the first selector that is not valid CSS.
    pub fn from_config(config: &SelectorConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            quote: compile_selector(&config.quote)?,
            text: compile_selector(&config.text)?,
            author: compile_selector(&config.author)?,
            tags: compile_selector(&config.tags)?,
            next_link: compile_selector(&config.next_link)?,
        })
    }
}

/// Compiles a single CSS selector
pub fn compile_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selectors_compile() {
        assert!(SelectorSet::from_config(&SelectorConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let config = SelectorConfig {
            author: "small[".to_string(),
            ..SelectorConfig::default()
        };
        let err = SelectorSet::from_config(&config).unwrap_err();
        match err {
            ExtractError::InvalidSelector { selector, .. } => assert_eq!(selector, "small["),
            other => panic!("unexpected error: {other}"),
        }
    }
}
