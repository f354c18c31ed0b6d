//! Feed file export
//!
//! Streams scraped items to a file as JSON Lines or as one JSON array.

use crate::config::FeedFormat;
use crate::extract::QuoteRecord;
use crate::output::traits::{ItemSink, OutputResult, ScrapedItem};
use crate::storage::RunStatus;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Item sink that writes records to a feed file
///
/// In `Json` format the opening bracket is written on creation and the
/// closing one on `finalize`, so a feed that was never finalized is not
/// valid JSON.
pub struct FeedWriter<W: Write = BufWriter<File>> {
    writer: W,
    format: FeedFormat,
    items_written: u64,
    finished: bool,
    label: String,
}

impl FeedWriter<BufWriter<File>> {
    /// Creates (or truncates) the feed file at `path`
    pub fn create(path: &Path, format: FeedFormat) -> OutputResult<Self> {
        let file = File::create(path)?;
        let mut feed = Self::from_writer(BufWriter::new(file), format)?;
        feed.label = PathBuf::from(path).display().to_string();
        Ok(feed)
    }
}

impl<W: Write> FeedWriter<W> {
    /// Wraps any writer
    pub fn from_writer(mut writer: W, format: FeedFormat) -> OutputResult<Self> {
        if format == FeedFormat::Json {
            writer.write_all(b"[")?;
        }
        Ok(Self {
            writer,
            format,
            items_written: 0,
            finished: false,
            label: "feed".to_string(),
        })
    }

    /// Writes one record
    pub fn write_record(&mut self, record: &QuoteRecord) -> OutputResult<()> {
        match self.format {
            FeedFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, record)?;
                self.writer.write_all(b"\n")?;
            }
            FeedFormat::Json => {
                if self.items_written > 0 {
                    self.writer.write_all(b",")?;
                }
                self.writer.write_all(b"\n")?;
                serde_json::to_writer(&mut self.writer, record)?;
            }
        }
        self.items_written += 1;
        Ok(())
    }

    /// Closes the feed and flushes it; later calls do nothing
    pub fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        if self.format == FeedFormat::Json {
            self.writer.write_all(b"\n]\n")?;
        }
        self.writer.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Number of records written so far
    pub fn items_written(&self) -> u64 {
        self.items_written
    }

    /// Consumes the feed and returns the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ItemSink for FeedWriter<W> {
    fn name(&self) -> &str {
        &self.label
    }

    fn record_item(&mut self, item: &ScrapedItem) -> OutputResult<()> {
        self.write_record(&item.record)
    }

    fn finalize(&mut self, status: RunStatus) -> OutputResult<()> {
        self.finish()?;
        tracing::debug!(
            "Feed {} closed with {} items ({})",
            self.label,
            self.items_written,
            status.to_db_string()
        );
        Ok(())
    }
}

/// Writes a complete feed file from already stored records
///
/// Returns the number of records written.
pub fn write_feed<'a, I>(path: &Path, format: FeedFormat, records: I) -> OutputResult<u64>
where
    I: IntoIterator<Item = &'a QuoteRecord>,
{
    let mut feed = FeedWriter::create(path, format)?;
    for record in records {
        feed.write_record(record)?;
    }
    feed.finish()?;
    Ok(feed.items_written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn records() -> Vec<QuoteRecord> {
        vec![
            QuoteRecord::new(
                Some("\u{201c}First.\u{201d}".to_string()),
                Some("Albert Einstein".to_string()),
                vec!["change".to_string(), "world".to_string()],
            ),
            QuoteRecord::new(None, Some("Jane Austen".to_string()), vec![]),
        ]
    }

    fn render(format: FeedFormat, records: &[QuoteRecord]) -> String {
        let mut feed = FeedWriter::from_writer(Vec::new(), format).unwrap();
        for record in records {
            feed.write_record(record).unwrap();
        }
        feed.finish().unwrap();
        String::from_utf8(feed.into_inner()).unwrap()
    }

    #[test]
    fn test_json_lines_one_object_per_line() {
        let output = render(FeedFormat::JsonLines, &records());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: QuoteRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, records()[0]);
        assert_eq!(
            lines[1],
            r#"{"text":null,"author":"Jane Austen","tags":[]}"#
        );
    }

    #[test]
    fn test_json_array() {
        let output = render(FeedFormat::Json, &records());
        let parsed: Vec<QuoteRecord> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, records());
    }

    #[test]
    fn test_empty_json_array_is_valid() {
        let output = render(FeedFormat::Json, &[]);
        let parsed: Vec<QuoteRecord> = serde_json::from_str(&output).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(render(FeedFormat::JsonLines, &[]), "");
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut feed = FeedWriter::from_writer(Vec::new(), FeedFormat::Json).unwrap();
        feed.finish().unwrap();
        feed.finish().unwrap();
        assert_eq!(String::from_utf8(feed.into_inner()).unwrap(), "[\n]\n");
    }

    #[test]
    fn test_sink_writes_item_records() {
        let mut feed = FeedWriter::from_writer(Vec::new(), FeedFormat::JsonLines).unwrap();
        let item = ScrapedItem {
            page_id: 1,
            page_url: "http://quotes.toscrape.com/page/1/".to_string(),
            position: 0,
            record: records()[0].clone(),
        };
        feed.record_item(&item).unwrap();
        feed.finalize(RunStatus::Completed).unwrap();
        assert_eq!(feed.items_written(), 1);
    }

    #[test]
    fn test_write_feed_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotes.jl");

        let written = write_feed(&path, FeedFormat::JsonLines, &records()).unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
