//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Quotes-Spider database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    spider_name TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Every page requested during a run
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    domain TEXT NOT NULL,
    depth INTEGER NOT NULL DEFAULT 0,
    referer TEXT,
    state TEXT NOT NULL,
    status_code INTEGER,
    content_type TEXT,
    error_message TEXT,
    record_count INTEGER NOT NULL DEFAULT 0,
    next_link TEXT,
    discovered_at TEXT NOT NULL,
    visited_at TEXT,
    UNIQUE(run_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_run ON pages(run_id);
CREATE INDEX IF NOT EXISTS idx_pages_state ON pages(state);

-- Scraped quote records, tags stored as a JSON array
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    page_id INTEGER NOT NULL REFERENCES pages(id),
    position INTEGER NOT NULL,
    text TEXT,
    author TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_quotes_run ON quotes(run_id);
CREATE INDEX IF NOT EXISTS idx_quotes_author ON quotes(author);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
