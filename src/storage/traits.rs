//! Storage traits and error types

use crate::extract::QuoteRecord;
use crate::state::PageState;
use crate::storage::{PageRecord, RunRecord, RunStatus, StoredQuote};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Everything is scoped by run: the same URL may be crawled again in a later
/// run without clashing with earlier results.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `spider_name` - Name of the spider from the configuration
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, spider_name: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets the final status of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed)
    }

    /// Marks a run as failed
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed)
    }

    // ===== Page Management =====

    /// Inserts a queued page or gets the existing page ID for this run
    ///
    /// # Arguments
    ///
    /// * `run_id` - The run requesting the page
    /// * `url` - Absolute URL of the page
    /// * `domain` - The domain extracted from the URL
    /// * `depth` - Pagination hops from the start URL
    /// * `referer` - The page whose next link led here, if any
    fn insert_page(
        &mut self,
        run_id: i64,
        url: &str,
        domain: &str,
        depth: u32,
        referer: Option<&str>,
    ) -> StorageResult<i64>;

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord>;

    /// Gets a page of a run by URL
    fn get_page_by_url(&self, run_id: i64, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Gets every page of a run in request order
    fn get_pages(&self, run_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Updates the state of a page
    fn update_page_state(
        &mut self,
        page_id: i64,
        state: PageState,
        status_code: Option<u16>,
        content_type: Option<&str>,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Marks a page as parsed and stores what the parser found on it
    ///
    /// # Arguments
    ///
    /// * `record_count` - Number of quote records extracted
    /// * `next_link` - Raw next-page link, as written in the page
    fn record_parse_result(
        &mut self,
        page_id: i64,
        status_code: u16,
        content_type: &str,
        record_count: usize,
        next_link: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Quotes =====

    /// Stores one scraped record
    ///
    /// # Arguments
    ///
    /// * `position` - Index of the record on its page
    fn insert_quote(
        &mut self,
        run_id: i64,
        page_id: i64,
        position: usize,
        record: &QuoteRecord,
    ) -> StorageResult<i64>;

    /// Loads the quotes of a run in scrape order
    fn load_quotes(&self, run_id: i64) -> StorageResult<Vec<StoredQuote>>;

    // ===== Statistics =====

    /// Counts pages of a run in the given state
    fn count_pages_by_state(&self, run_id: i64, state: PageState) -> StorageResult<u64>;

    /// Counts the quotes scraped in a run
    fn count_quotes(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts distinct non-null authors in a run
    fn count_unique_authors(&self, run_id: i64) -> StorageResult<u64>;

    /// Most quoted authors, most frequent first
    fn top_authors(&self, run_id: i64, limit: usize) -> StorageResult<Vec<(String, u64)>>;

    /// Most used tags, most frequent first
    fn top_tags(&self, run_id: i64, limit: usize) -> StorageResult<Vec<(String, u64)>>;
}
