//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::extract::QuoteRecord;
use crate::state::PageState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{PageRecord, RunRecord, RunStatus, StoredQuote};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const PAGE_COLUMNS: &str = "id, run_id, url, domain, depth, referer, state, status_code,
     content_type, error_message, record_count, next_link, discovered_at, visited_at";

const RUN_COLUMNS: &str = "id, spider_name, started_at, finished_at, config_hash, status";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        run_id: row.get(1)?,
        url: row.get(2)?,
        domain: row.get(3)?,
        depth: row.get(4)?,
        referer: row.get(5)?,
        state: PageState::from_db_string(&row.get::<_, String>(6)?).unwrap_or(PageState::Failed),
        status_code: row.get(7)?,
        content_type: row.get(8)?,
        error_message: row.get(9)?,
        record_count: row.get(10)?,
        next_link: row.get(11)?,
        discovered_at: row.get(12)?,
        visited_at: row.get(13)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        spider_name: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Running),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, spider_name: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (spider_name, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![spider_name, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Page Management =====

    fn insert_page(
        &mut self,
        run_id: i64,
        url: &str,
        domain: &str,
        depth: u32,
        referer: Option<&str>,
    ) -> StorageResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM pages WHERE run_id = ?1 AND url = ?2",
                params![run_id, url],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO pages (run_id, url, domain, depth, referer, state, discovered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                url,
                domain,
                depth,
                referer,
                PageState::Queued.to_db_string(),
                now
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?
            .ok_or(StorageError::PageNotFound(page_id))
    }

    fn get_page_by_url(&self, run_id: i64, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM pages WHERE run_id = ?1 AND url = ?2",
                    PAGE_COLUMNS
                ),
                params![run_id, url],
                page_from_row,
            )
            .optional()?;

        Ok(page)
    }

    fn get_pages(&self, run_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages WHERE run_id = ?1 ORDER BY id",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map(params![run_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn update_page_state(
        &mut self,
        page_id: i64,
        state: PageState,
        status_code: Option<u16>,
        content_type: Option<&str>,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE pages SET state = ?1, status_code = COALESCE(?2, status_code),
             content_type = COALESCE(?3, content_type), error_message = ?4, visited_at = ?5
             WHERE id = ?6",
            params![
                state.to_db_string(),
                status_code,
                content_type,
                error_message,
                now,
                page_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::PageNotFound(page_id));
        }
        Ok(())
    }

    fn record_parse_result(
        &mut self,
        page_id: i64,
        status_code: u16,
        content_type: &str,
        record_count: usize,
        next_link: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE pages SET state = ?1, status_code = ?2, content_type = ?3,
             record_count = ?4, next_link = ?5, error_message = NULL, visited_at = ?6
             WHERE id = ?7",
            params![
                PageState::Parsed.to_db_string(),
                status_code,
                content_type,
                record_count as i64,
                next_link,
                now,
                page_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::PageNotFound(page_id));
        }
        Ok(())
    }

    // ===== Quotes =====

    fn insert_quote(
        &mut self,
        run_id: i64,
        page_id: i64,
        position: usize,
        record: &QuoteRecord,
    ) -> StorageResult<i64> {
        let tags = serde_json::to_string(&record.tags)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO quotes (run_id, page_id, position, text, author, tags, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                page_id,
                position as i64,
                record.text,
                record.author,
                tags,
                now
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn load_quotes(&self, run_id: i64) -> StorageResult<Vec<StoredQuote>> {
        let mut stmt = self.conn.prepare(
            "SELECT q.page_id, p.url, q.position, q.text, q.author, q.tags
             FROM quotes q JOIN pages p ON p.id = q.page_id
             WHERE q.run_id = ?1
             ORDER BY q.id",
        )?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(page_id, page_url, position, text, author, tags)| {
                let tags: Vec<String> = serde_json::from_str(&tags)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(StoredQuote {
                    page_id,
                    page_url,
                    position,
                    record: QuoteRecord::new(text, author, tags),
                })
            })
            .collect()
    }

    // ===== Statistics =====

    fn count_pages_by_state(&self, run_id: i64, state: PageState) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE run_id = ?1 AND state = ?2",
            params![run_id, state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_quotes(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM quotes WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_unique_authors(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT author) FROM quotes WHERE run_id = ?1 AND author IS NOT NULL",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn top_authors(&self, run_id: i64, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT author, COUNT(*) AS n FROM quotes
             WHERE run_id = ?1 AND author IS NOT NULL
             GROUP BY author
             ORDER BY n DESC, author ASC
             LIMIT ?2",
        )?;

        let authors = stmt
            .query_map(params![run_id, limit as i64], |row| {
                Ok((row.get(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(authors)
    }

    fn top_tags(&self, run_id: i64, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT tag.value, COUNT(*) AS n FROM quotes, json_each(quotes.tags) AS tag
             WHERE quotes.run_id = ?1
             GROUP BY tag.value
             ORDER BY n DESC, tag.value ASC
             LIMIT ?2",
        )?;

        let tags = stmt
            .query_map(params![run_id, limit as i64], |row| {
                Ok((row.get(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }
}
