//! Output sink traits and types
//!
//! This module defines the trait every item sink implements and the data
//! structures used for run summaries.

use crate::extract::QuoteRecord;
use crate::state::PageState;
use crate::storage::RunStatus;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize item: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One scraped record together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedItem {
    /// Storage ID of the page the record was found on
    pub page_id: i64,

    /// URL of that page (final URL after redirects)
    pub page_url: String,

    /// Index of the record on its page
    pub position: usize,

    /// The extracted record
    pub record: QuoteRecord,
}

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub run_id: i64,
    pub spider_name: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Pages
    pub total_pages: u64,
    pub pages_by_state: Vec<(PageState, u64)>,

    // Quotes
    pub total_quotes: u64,
    pub unique_authors: u64,
    pub top_authors: Vec<(String, u64)>,
    pub top_tags: Vec<(String, u64)>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages that ended in the given state
    pub fn pages_in(&self, state: PageState) -> u64 {
        self.pages_by_state
            .iter()
            .find(|(s, _)| *s == state)
            .map_or(0, |(_, count)| *count)
    }

    /// Number of pages in an error state
    pub fn total_errors(&self) -> u64 {
        self.pages_by_state
            .iter()
            .filter(|(state, _)| state.is_error())
            .map(|(_, count)| count)
            .sum()
    }

    /// Returns the share of terminal pages that were parsed, as a percentage
    pub fn success_rate(&self) -> f64 {
        let terminal: u64 = self
            .pages_by_state
            .iter()
            .filter(|(state, _)| state.is_terminal())
            .map(|(_, count)| count)
            .sum();
        if terminal == 0 {
            return 0.0;
        }
        (self.pages_in(PageState::Parsed) as f64 / terminal as f64) * 100.0
    }

    /// Average number of quotes per parsed page
    pub fn quotes_per_page(&self) -> f64 {
        let parsed = self.pages_in(PageState::Parsed);
        if parsed == 0 {
            return 0.0;
        }
        self.total_quotes as f64 / parsed as f64
    }
}

/// Destination for scraped items
///
/// The coordinator hands every record to each sink in scrape order and calls
/// `finalize` once when the crawl ends.
pub trait ItemSink: Send {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Records one scraped item
    fn record_item(&mut self, item: &ScrapedItem) -> OutputResult<()>;

    /// Finalizes the sink, performing any final writes
    ///
    /// # Arguments
    ///
    /// * `status` - The final status of the crawl run
    fn finalize(&mut self, status: RunStatus) -> OutputResult<()>;
}
