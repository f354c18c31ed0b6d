//! Output module for scraped items and crawl reports
//!
//! This module handles:
//! - Item sinks that receive every scraped record (database, feed file)
//! - Markdown summaries of a run
//! - Run statistics and feed export from the database

mod feed;
mod markdown;
mod sqlite_output;
pub mod stats;
mod traits;

pub use feed::{write_feed, FeedWriter};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sqlite_output::SqliteOutputHandler;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{CrawlSummary, ItemSink, OutputError, OutputResult, ScrapedItem};

use crate::config::FeedFormat;
use crate::storage::{RunRecord, Storage};
use crate::SpiderError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Returns the most recent run, or an error when the database has none
pub fn latest_run(storage: &dyn Storage) -> Result<RunRecord, SpiderError> {
    storage
        .get_latest_run()?
        .ok_or_else(|| SpiderError::Storage("No crawl runs found in database".to_string()))
}

/// Builds the summary of one run
pub fn summarize_run(storage: &dyn Storage, run: &RunRecord) -> Result<CrawlSummary, SpiderError> {
    let duration_seconds = run.finished_at.as_deref().and_then(|finished| {
        let started = run.started_at.parse::<DateTime<Utc>>().ok()?;
        let finished = finished.parse::<DateTime<Utc>>().ok()?;
        Some((finished - started).num_seconds().max(0) as u64)
    });

    let stats = load_statistics(storage, run.id)?;

    Ok(CrawlSummary {
        run_id: run.id,
        spider_name: run.spider_name.clone(),
        started_at: run.started_at.clone(),
        finished_at: run.finished_at.clone(),
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash.clone(),
        total_pages: stats.total_pages,
        pages_by_state: stats.pages_by_state,
        total_quotes: stats.total_quotes,
        unique_authors: stats.unique_authors,
        top_authors: stats.top_authors,
        top_tags: stats.top_tags,
    })
}

/// Generates the summary of the latest run in storage
pub fn generate_summary(storage: &dyn Storage) -> Result<CrawlSummary, SpiderError> {
    let run = latest_run(storage)?;
    summarize_run(storage, &run)
}

/// Re-exports the quotes of the latest run as a feed file
///
/// Returns the number of records written.
pub fn export_feed(
    storage: &dyn Storage,
    path: &Path,
    format: FeedFormat,
) -> Result<u64, SpiderError> {
    let run = latest_run(storage)?;
    let quotes = storage.load_quotes(run.id)?;
    let written = write_feed(path, format, quotes.iter().map(|q| &q.record))?;
    Ok(written)
}
