//! SQLite item sink
//!
//! Writes every scraped record to the `quotes` table of the run.

use crate::output::traits::{ItemSink, OutputError, OutputResult, ScrapedItem};
use crate::storage::{RunStatus, Storage};
use std::sync::{Arc, Mutex};

/// Item sink that stores records in the crawl database
pub struct SqliteOutputHandler {
    storage: Arc<Mutex<dyn Storage + Send>>,
    run_id: i64,
    items_written: u64,
}

impl SqliteOutputHandler {
    /// Creates a new SQLite output handler
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend shared with the coordinator
    /// * `run_id` - The current run ID
    pub fn new(storage: Arc<Mutex<dyn Storage + Send>>, run_id: i64) -> Self {
        Self {
            storage,
            run_id,
            items_written: 0,
        }
    }

    /// Number of records stored so far
    pub fn items_written(&self) -> u64 {
        self.items_written
    }
}

impl ItemSink for SqliteOutputHandler {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn record_item(&mut self, item: &ScrapedItem) -> OutputResult<()> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))?;

        storage
            .insert_quote(self.run_id, item.page_id, item.position, &item.record)
            .map_err(|e| OutputError::Storage(e.to_string()))?;

        self.items_written += 1;
        Ok(())
    }

    fn finalize(&mut self, status: RunStatus) -> OutputResult<()> {
        tracing::debug!(
            "SQLite sink stored {} items for run {} ({})",
            self.items_written,
            self.run_id,
            status.to_db_string()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::QuoteRecord;
    use crate::storage::SqliteStorage;

    fn item(page_id: i64, position: usize, text: &str) -> ScrapedItem {
        ScrapedItem {
            page_id,
            page_url: "http://quotes.toscrape.com/page/1/".to_string(),
            position,
            record: QuoteRecord::new(
                Some(text.to_string()),
                Some("Author".to_string()),
                vec!["tag".to_string()],
            ),
        }
    }

    #[test]
    fn test_records_items_in_storage() {
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        let (run_id, page_id) = {
            let mut s = storage.lock().unwrap();
            let run_id = s.create_run("quotes2", "hash").unwrap();
            let page_id = s
                .insert_page(
                    run_id,
                    "http://quotes.toscrape.com/page/1/",
                    "quotes.toscrape.com",
                    0,
                    None,
                )
                .unwrap();
            (run_id, page_id)
        };

        let mut sink = SqliteOutputHandler::new(storage.clone(), run_id);
        sink.record_item(&item(page_id, 0, "first")).unwrap();
        sink.record_item(&item(page_id, 1, "second")).unwrap();
        sink.finalize(RunStatus::Completed).unwrap();

        assert_eq!(sink.items_written(), 2);

        let quotes = storage.lock().unwrap().load_quotes(run_id).unwrap();
        let texts: Vec<_> = quotes
            .iter()
            .map(|q| q.record.text.clone().unwrap())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_unknown_page_is_an_error() {
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        let run_id = storage.lock().unwrap().create_run("quotes2", "hash").unwrap();

        let mut sink = SqliteOutputHandler::new(storage, run_id);
        let result = sink.record_item(&item(42, 0, "orphan"));
        assert!(matches!(result, Err(OutputError::Storage(_))));
    }
}
