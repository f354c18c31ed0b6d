//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! run statistics from the storage layer.

use crate::state::PageState;
use crate::storage::Storage;
use crate::SpiderError;

/// How many authors and tags the statistics list
pub const TOP_LIMIT: usize = 10;

/// Statistics for one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Run the statistics belong to
    pub run_id: i64,

    /// Total number of pages recorded
    pub total_pages: u64,

    /// Non-zero page counts, in state order
    pub pages_by_state: Vec<(PageState, u64)>,

    /// Number of quotes scraped
    pub total_quotes: u64,

    /// Number of distinct authors
    pub unique_authors: u64,

    /// Most quoted authors
    pub top_authors: Vec<(String, u64)>,

    /// Most used tags
    pub top_tags: Vec<(String, u64)>,
}

impl CrawlStatistics {
    /// Count for one page state
    pub fn pages_in(&self, state: PageState) -> u64 {
        self.pages_by_state
            .iter()
            .find(|(s, _)| *s == state)
            .map_or(0, |(_, count)| *count)
    }
}

/// Loads statistics for a run from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `run_id` - The run to summarize
pub fn load_statistics(storage: &dyn Storage, run_id: i64) -> Result<CrawlStatistics, SpiderError> {
    let mut pages_by_state = Vec::new();
    let mut total_pages = 0;

    for state in PageState::all_states() {
        let count = storage.count_pages_by_state(run_id, state)?;
        total_pages += count;
        if count > 0 {
            pages_by_state.push((state, count));
        }
    }

    Ok(CrawlStatistics {
        run_id,
        total_pages,
        pages_by_state,
        total_quotes: storage.count_quotes(run_id)?,
        unique_authors: storage.count_unique_authors(run_id)?,
        top_authors: storage.top_authors(run_id, TOP_LIMIT)?,
        top_tags: storage.top_tags(run_id, TOP_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics (run {}) ===\n", stats.run_id);

    println!("Overview:");
    println!("  Total pages: {}", stats.total_pages);
    println!("  Quotes scraped: {}", stats.total_quotes);
    println!("  Unique authors: {}", stats.unique_authors);
    println!();

    println!("Pages by State:");
    for (state, count) in &stats.pages_by_state {
        let percentage = if stats.total_pages > 0 {
            (*count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    if !stats.top_authors.is_empty() {
        println!("Top Authors:");
        for (author, count) in &stats.top_authors {
            println!("  {}: {}", author, count);
        }
        println!();
    }

    if !stats.top_tags.is_empty() {
        println!("Top Tags:");
        for (tag, count) in &stats.top_tags {
            println!("  {}: {}", tag, count);
        }
        println!();
    }

    let parsed = stats.pages_in(PageState::Parsed);
    let success_rate = if stats.total_pages > 0 {
        (parsed as f64 / stats.total_pages as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages parsed)",
        success_rate, parsed, stats.total_pages
    );
}
