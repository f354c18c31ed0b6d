//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the spider:
//! - SQLite database initialization and schema management
//! - Run tracking
//! - Page state per run
//! - Scraped quote records

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::extract::QuoteRecord;
use crate::state::PageState;

/// Represents a page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub run_id: i64,
    pub url: String,
    pub domain: String,
    pub depth: u32,
    pub referer: Option<String>,
    pub state: PageState,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub error_message: Option<String>,
    pub record_count: u32,
    pub next_link: Option<String>,
    pub discovered_at: String,
    pub visited_at: Option<String>,
}

/// A scraped quote together with where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuote {
    pub page_id: i64,
    pub page_url: String,
    pub position: u32,
    pub record: QuoteRecord,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub spider_name: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in [RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            assert_eq!(
                RunStatus::from_db_string(status.to_db_string()),
                Some(status)
            );
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("interrupted"), None);
    }
}
