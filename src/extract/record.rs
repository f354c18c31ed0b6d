use serde::{Deserialize, Serialize};

/// One quote scraped from a listing page
///
/// `text` and `author` are absent when the card lacks the matching element.
/// `tags` is always present and empty when the card has no tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub text: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl QuoteRecord {
    pub fn new(text: Option<String>, author: Option<String>, tags: Vec<String>) -> Self {
        Self { text, author, tags }
    }
}
