//! Markdown summary generation
//!
//! Renders a crawl summary as a human-readable markdown report.

use crate::output::traits::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a run to `output_path`
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Crawl Summary: {}\n\n", summary.spider_name));

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total Pages**: {}\n", summary.total_pages));
    md.push_str(&format!("- **Quotes Scraped**: {}\n", summary.total_quotes));
    md.push_str(&format!(
        "- **Unique Authors**: {}\n",
        summary.unique_authors
    ));
    md.push_str(&format!(
        "- **Quotes per Page**: {:.2}\n",
        summary.quotes_per_page()
    ));
    md.push_str(&format!("- **Total Errors**: {}\n", summary.total_errors()));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        summary.success_rate()
    ));

    // State breakdown
    md.push_str("## Page State Breakdown\n\n");
    if summary.pages_by_state.is_empty() {
        md.push_str("No pages were recorded.\n\n");
    } else {
        md.push_str("| State | Count |\n");
        md.push_str("|-------|-------|\n");
        for (state, count) in &summary.pages_by_state {
            md.push_str(&format!("| {} | {} |\n", state, count));
        }
        md.push('\n');
    }

    if !summary.top_authors.is_empty() {
        md.push_str("## Top Authors\n\n");
        md.push_str("| Author | Quotes |\n");
        md.push_str("|--------|--------|\n");
        for (author, count) in &summary.top_authors {
            md.push_str(&format!("| {} | {} |\n", escape_cell(author), count));
        }
        md.push('\n');
    }

    if !summary.top_tags.is_empty() {
        md.push_str("## Top Tags\n\n");
        md.push_str("| Tag | Quotes |\n");
        md.push_str("|-----|--------|\n");
        for (tag, count) in &summary.top_tags {
            md.push_str(&format!("| {} | {} |\n", escape_cell(tag), count));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str(&format!(
        "*Generated by quotes-spider v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    md
}

/// Pipes would split a table cell
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
