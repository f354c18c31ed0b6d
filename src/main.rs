//! Quotes-Spider main entry point
//!
//! This is the command-line interface for the quote listing spider.

use anyhow::{bail, Context};
use clap::Parser;
use quotes_spider::config::{load_config_with_hash, Config};
use quotes_spider::crawler::crawl;
use quotes_spider::extract::{parse_html, QuoteParser};
use quotes_spider::output::{
    export_feed, generate_markdown_summary, generate_summary, latest_run, load_statistics,
    print_statistics,
};
use quotes_spider::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Summary file used by --export-summary when the config names none
const DEFAULT_SUMMARY_PATH: &str = "./summary.md";

/// Quotes-Spider: a polite quote listing spider
///
/// Crawls paginated quote listings, extracting each quote's text, author and
/// tags and following the next-page link until the listing ends.
#[derive(Parser, Debug)]
#[command(name = "quotes-spider")]
#[command(version)]
#[command(about = "A polite quote listing spider", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary", "export_feed", "parse_file"])]
    dry_run: bool,

    /// Show statistics of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary", "export_feed", "parse_file"])]
    stats: bool,

    /// Write the markdown summary of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export_feed", "parse_file"])]
    export_summary: bool,

    /// Write the quotes of the latest run to a feed file and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["dry_run", "stats", "export_summary", "parse_file"])]
    export_feed: Option<PathBuf>,

    /// Parse a saved HTML page, print its quotes as JSON Lines and exit
    #[arg(long, value_name = "HTML", conflicts_with_all = ["dry_run", "stats", "export_summary", "export_feed"])]
    parse_file: Option<PathBuf>,

    /// URL the saved page was served from (defaults to the first start URL)
    #[arg(long, value_name = "URL", requires = "parse_file")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context(format!("invalid configuration {}", cli.config.display()));
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else if let Some(path) = &cli.export_feed {
        handle_export_feed(&config, path)?;
    } else if let Some(path) = &cli.parse_file {
        handle_parse_file(&config, path, cli.base_url.as_deref())?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("quotes_spider=info,warn"),
            1 => EnvFilter::new("quotes_spider=debug,info"),
            2 => EnvFilter::new("quotes_spider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    if !path.exists() {
        bail!("database {} does not exist; run a crawl first", path.display());
    }
    SqliteStorage::new(path).with_context(|| format!("failed to open {}", path.display()))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Quotes-Spider Dry Run ===\n");

    println!("Spider Configuration:");
    println!("  Name: {}", config.spider.name);
    if config.spider.max_pages == 0 {
        println!("  Max pages: unlimited");
    } else {
        println!("  Max pages: {}", config.spider.max_pages);
    }
    println!("  Download delay: {}ms", config.spider.download_delay);
    println!("  Obey robots.txt: {}", config.spider.obey_robots);
    println!("  Next link scope: {:?}", config.spider.next_link_scope);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.spider.retry_times, config.spider.retry_backoff
    );
    println!("  Request timeout: {}s", config.spider.request_timeout);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent_string());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    match &config.output.feed_path {
        Some(path) => println!("  Feed: {} ({:?})", path, config.output.feed_format),
        None => println!("  Feed: none"),
    }
    println!(
        "  Summary: {}",
        config.output.summary_path.as_deref().unwrap_or("none")
    );

    println!("\nSelectors:");
    println!("  Quote: {}", config.selectors.quote);
    println!("  Text: {}", config.selectors.text);
    println!("  Author: {}", config.selectors.author);
    println!("  Tags: {}", config.selectors.tags);
    println!("  Next link: {}", config.selectors.next_link);

    println!("\nAllowed Domains ({}):", config.spider.allowed_domains.len());
    if config.spider.allowed_domains.is_empty() {
        println!("  (any)");
    }
    for domain in &config.spider.allowed_domains {
        println!("  - {}", domain);
    }

    println!("\nStart URLs ({}):", config.spider.start_urls.len());
    for url in &config.spider.start_urls {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(config)?;
    let run = latest_run(&storage)?;
    let stats = load_statistics(&storage, run.id)?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    let output = config
        .output
        .summary_path
        .as_deref()
        .unwrap_or(DEFAULT_SUMMARY_PATH);

    println!("=== Exporting Crawl Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", output);
    println!();

    let storage = open_storage(config)?;

    tracing::info!("Loading crawl data from database...");
    let summary = generate_summary(&storage)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(output))?;

    println!("✓ Summary exported to: {}", output);

    Ok(())
}

/// Handles the --export-feed mode: writes the latest run's quotes to a feed
fn handle_export_feed(config: &Config, path: &Path) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let written = export_feed(&storage, path, config.output.feed_format)?;

    println!(
        "✓ Exported {} quotes to {} ({:?})",
        written,
        path.display(),
        config.output.feed_format
    );

    Ok(())
}

/// Handles the --parse-file mode: runs the parser over a saved page
fn handle_parse_file(config: &Config, path: &Path, base_url: Option<&str>) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let base = match base_url {
        Some(url) => url,
        None => config
            .spider
            .start_urls
            .first()
            .map(String::as_str)
            .context("no --base-url given and no start URL configured")?,
    };
    let base = Url::parse(base).with_context(|| format!("invalid base URL {}", base))?;

    let parser = QuoteParser::from_config(&config.selectors, config.spider.next_link_scope)?;
    let outcome = parse_html(&parser, &base, &html)?;

    for record in &outcome.records {
        println!("{}", serde_json::to_string(record)?);
    }

    match &outcome.next {
        Some(next) => match next.resolve(&base) {
            Ok(url) => tracing::info!("Next page: {} ({})", next.target, url),
            Err(e) => tracing::warn!("Next page {:?} does not resolve: {}", next.target, e),
        },
        None => tracing::info!("No next page"),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Spider '{}' starting from {} URLs",
        config.spider.name,
        config.spider.start_urls.len()
    );

    match crawl(config, config_hash).await {
        Ok(report) => {
            tracing::info!(
                "Crawl completed successfully: {} quotes from {} pages",
                report.items_scraped,
                report.pages_fetched
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
