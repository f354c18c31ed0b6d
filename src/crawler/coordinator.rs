//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the work queue. It seeds the scheduler with the start
//! URLs, and for every request it checks robots.txt, fetches the page, runs
//! the quote parser, hands the records to the item sinks and follows the
//! next-page link.

use crate::config::Config;
use crate::crawler::scheduler::{QueuedRequest, Scheduled, Scheduler};
use crate::crawler::{build_http_client, fetch_url, FetchResult, RetryPolicy};
use crate::extract::{parse_html, FollowRequest, QuoteParser};
use crate::output::{
    generate_markdown_summary, summarize_run, FeedWriter, ItemSink, ScrapedItem,
    SqliteOutputHandler,
};
use crate::robots::fetch_robots;
use crate::state::PageState;
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::url::{extract_domain, is_allowed_domain};
use crate::SpiderError;
use reqwest::Client;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use url::Url;

/// Counters describing a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Run the crawl was recorded under
    pub run_id: i64,

    /// Pages a GET request was sent for
    pub pages_fetched: u32,

    /// Pages that ended in an error state
    pub pages_failed: u32,

    /// Pages skipped because robots.txt disallows them
    pub robots_denied: u32,

    /// Records handed to the item sinks
    pub items_scraped: u64,

    /// Follow-up requests dropped as duplicates
    pub duplicates_filtered: u64,

    /// Follow-up requests dropped for leaving `allowed-domains`
    pub offsite_filtered: u64,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    storage: Arc<Mutex<SqliteStorage>>,
    scheduler: Scheduler,
    parser: QuoteParser,
    client: Client,
    retry: RetryPolicy,
    sinks: Vec<Box<dyn ItemSink>>,
    run_id: i64,
    agent: String,
    report: CrawlReport,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Opens the database, records a new run and seeds the frontier with the
    /// configured start URLs.
    ///
    /// # Arguments
    ///
    /// * `config` - The spider configuration
    /// * `config_hash` - Hash of the configuration file, stored with the run
    pub fn new(config: Config, config_hash: &str) -> Result<Self, SpiderError> {
        let storage_path = Path::new(&config.output.database_path);
        let mut storage = SqliteStorage::new(storage_path)?;
        let run_id = storage.create_run(&config.spider.name, config_hash)?;
        tracing::info!("Created run {} for spider '{}'", run_id, config.spider.name);

        let parser = QuoteParser::from_config(&config.selectors, config.spider.next_link_scope)?;
        let client = build_http_client(&config)?;
        let agent = config.user_agent.crawler_name.clone();
        let scheduler = Scheduler::new(&config.spider, &agent);
        let retry = RetryPolicy::from_config(&config.spider);

        let storage = Arc::new(Mutex::new(storage));
        let shared: Arc<Mutex<dyn Storage + Send>> = storage.clone();

        let mut sinks: Vec<Box<dyn ItemSink>> =
            vec![Box::new(SqliteOutputHandler::new(shared, run_id))];
        if let Some(feed_path) = &config.output.feed_path {
            let feed = FeedWriter::create(Path::new(feed_path), config.output.feed_format)?;
            tracing::info!("Writing {:?} feed to {}", config.output.feed_format, feed_path);
            sinks.push(Box::new(feed));
        }

        let mut coordinator = Self {
            config: Arc::new(config),
            storage,
            scheduler,
            parser,
            client,
            retry,
            sinks,
            run_id,
            agent,
            report: CrawlReport {
                run_id,
                ..CrawlReport::default()
            },
        };

        coordinator.seed()?;
        Ok(coordinator)
    }

    /// Returns the ID of the run this coordinator records into
    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Queues the start URLs at depth 0
    fn seed(&mut self) -> Result<(), SpiderError> {
        let config = Arc::clone(&self.config);
        for start_url in &config.spider.start_urls {
            let url = Url::parse(start_url)?;
            let domain = extract_domain(&url).ok_or_else(|| {
                SpiderError::Storage(format!("Failed to extract domain from {}", url))
            })?;

            if !self.scheduler.admit(&url) {
                continue;
            }

            let page_id = self
                .lock_storage()?
                .insert_page(self.run_id, url.as_str(), &domain, 0, None)?;

            self.scheduler.enqueue(QueuedRequest {
                url,
                domain,
                depth: 0,
                referer: None,
                page_id,
            });
        }

        tracing::info!("Seeded frontier with {} start URLs", self.scheduler.frontier_size());
        Ok(())
    }

    /// Runs the main crawl loop
    ///
    /// Takes requests from the scheduler until it has none left, then
    /// finalizes the sinks, marks the run completed and writes the markdown
    /// summary when `summary-path` is set. If the loop aborts, the sinks are
    /// still finalized and the run is marked failed.
    pub async fn run(&mut self) -> Result<CrawlReport, SpiderError> {
        tracing::info!("Starting crawl run {}", self.run_id);

        let start_time = Instant::now();
        let crawled = self.crawl_frontier(start_time).await;

        self.report.duplicates_filtered = self.scheduler.duplicates_filtered();
        self.report.elapsed = start_time.elapsed();

        if let Err(e) = crawled {
            tracing::error!("Crawl run {} aborted: {}", self.run_id, e);
            self.abort_run();
            return Err(e);
        }

        if let Err(e) = self.finalize_sinks(RunStatus::Completed) {
            self.lock_storage()?.fail_run(self.run_id)?;
            return Err(e);
        }
        self.lock_storage()?.complete_run(self.run_id)?;

        if let Some(summary_path) = &self.config.output.summary_path {
            self.write_summary(Path::new(summary_path))?;
        }

        tracing::info!(
            "Crawl completed: {} pages fetched, {} items scraped, {} failed, {} duplicates and {} offsite requests filtered in {:?}",
            self.report.pages_fetched,
            self.report.items_scraped,
            self.report.pages_failed,
            self.report.duplicates_filtered,
            self.report.offsite_filtered,
            self.report.elapsed
        );

        Ok(self.report.clone())
    }

    /// Processes requests until the scheduler runs dry
    async fn crawl_frontier(&mut self, start_time: Instant) -> Result<(), SpiderError> {
        let mut pages_processed: u32 = 0;

        while let Some(scheduled) = self.scheduler.next_request().await {
            match scheduled {
                Scheduled::RateLimited(request) => {
                    tracing::info!("Skipping {}: {} is rate limited", request.url, request.domain);
                    self.set_state(
                        request.page_id,
                        PageState::RateLimited,
                        None,
                        Some("Domain is rate limited"),
                    )?;
                    self.report.pages_failed += 1;
                }
                Scheduled::Ready(request) => {
                    if let Err(e) = self.process_request(&request).await {
                        tracing::error!("Error processing {}: {}", request.url, e);
                        self.fail_page(request.page_id, &e);
                    }
                }
            }

            pages_processed += 1;

            // Progress reporting every 10 pages
            if pages_processed % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = pages_processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} pages processed, {} items scraped, {} in frontier, {:.2} pages/sec",
                    pages_processed,
                    self.report.items_scraped,
                    self.scheduler.frontier_size(),
                    rate
                );
            }
        }

        Ok(())
    }

    /// Closes the sinks and marks the run failed after the crawl loop aborts
    fn abort_run(&mut self) {
        // Failures are logged by finalize_sinks
        let _ = self.finalize_sinks(RunStatus::Failed);

        let run_id = self.run_id;
        let failed = self
            .lock_storage()
            .and_then(|mut storage| storage.fail_run(run_id).map_err(SpiderError::from));
        if let Err(e) = failed {
            tracing::error!("Failed to mark run {} as failed: {}", run_id, e);
        }
    }

    /// Stores a page whose processing errored as failed, so it does not stay
    /// in `fetching`
    fn fail_page(&mut self, page_id: i64, error: &SpiderError) {
        self.report.pages_failed += 1;
        if let Err(e) = self.set_state(page_id, PageState::Failed, None, Some(&error.to_string())) {
            tracing::error!("Failed to mark page {} as failed: {}", page_id, e);
        }
    }

    /// Processes a single request
    ///
    /// 1. Marks the page as fetching
    /// 2. Checks robots.txt
    /// 3. Fetches the page
    /// 4. Parses it and follows the next link
    async fn process_request(&mut self, request: &QueuedRequest) -> Result<(), SpiderError> {
        let page_id = request.page_id;
        self.set_state(page_id, PageState::Fetching, None, None)?;

        if self.config.spider.obey_robots && !self.robots_allows(request).await {
            tracing::info!("URL {} disallowed by robots.txt", request.url);
            self.set_state(
                page_id,
                PageState::RobotsDenied,
                None,
                Some("Disallowed by robots.txt"),
            )?;
            self.report.robots_denied += 1;
            return Ok(());
        }

        self.scheduler.record_request(&request.domain);
        let fetch_result = fetch_url(&self.client, &request.url, &self.retry).await;
        self.report.pages_fetched += 1;

        match fetch_result {
            FetchResult::Success {
                final_url,
                status_code,
                content_type,
                body,
            } => {
                self.handle_page(request, &final_url, status_code, &content_type, &body)?;
            }

            FetchResult::ContentMismatch {
                status_code,
                content_type,
            } => {
                tracing::info!("Skipping {}: content type {}", request.url, content_type);
                self.lock_storage()?.update_page_state(
                    page_id,
                    PageState::ContentMismatch,
                    Some(status_code),
                    Some(&content_type),
                    Some(&format!("Expected HTML, got {}", content_type)),
                )?;
                self.report.pages_failed += 1;
            }

            FetchResult::HttpError { status_code, state } => {
                tracing::warn!("{} returned HTTP {} ({})", request.url, status_code, state);
                self.set_state(
                    page_id,
                    state,
                    Some(status_code),
                    Some(&format!("HTTP {}", status_code)),
                )?;
                self.report.pages_failed += 1;

                if state == PageState::RateLimited {
                    self.scheduler.mark_rate_limited(&request.domain);
                }
            }

            FetchResult::NetworkError { error, state } => {
                tracing::warn!("Failed to fetch {}: {}", request.url, error);
                self.set_state(page_id, state, None, Some(&error))?;
                self.report.pages_failed += 1;
            }
        }

        Ok(())
    }

    /// Checks the request against the domain's robots.txt, fetching it when
    /// the cache is empty or stale
    async fn robots_allows(&mut self, request: &QueuedRequest) -> bool {
        if self.scheduler.domain_state_mut(&request.domain).needs_robots() {
            tracing::debug!("Fetching robots.txt for domain: {}", request.domain);
            let robots = fetch_robots(&self.client, &request.url).await;
            self.scheduler
                .domain_state_mut(&request.domain)
                .update_robots(robots);
        }

        self.scheduler
            .domain_state_mut(&request.domain)
            .robots_allows(request.url.as_str(), &self.agent)
    }

    /// Runs the parser over a fetched page and dispatches its outcome
    fn handle_page(
        &mut self,
        request: &QueuedRequest,
        final_url: &Url,
        status_code: u16,
        content_type: &str,
        body: &str,
    ) -> Result<(), SpiderError> {
        let page_id = request.page_id;

        let outcome = match parse_html(&self.parser, final_url, body) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Failed to extract quotes from {}: {}", final_url, e);
                self.lock_storage()?.update_page_state(
                    page_id,
                    PageState::Failed,
                    Some(status_code),
                    Some(content_type),
                    Some(&e.to_string()),
                )?;
                self.report.pages_failed += 1;
                return Ok(());
            }
        };

        let record_count = outcome.records.len();
        for (position, record) in outcome.records.into_iter().enumerate() {
            let item = ScrapedItem {
                page_id,
                page_url: final_url.to_string(),
                position,
                record,
            };
            self.dispatch_item(&item);
            self.report.items_scraped += 1;
        }

        let next_link = outcome.next.as_ref().map(|next| next.target.as_str());
        self.lock_storage()?.record_parse_result(
            page_id,
            status_code,
            content_type,
            record_count,
            next_link,
        )?;

        tracing::debug!(
            "Parsed {}: {} quotes, next link {:?}",
            final_url,
            record_count,
            next_link
        );

        if let Some(next) = outcome.next {
            self.follow(&next, final_url, request)?;
        }

        Ok(())
    }

    /// Hands one item to every sink in order
    fn dispatch_item(&mut self, item: &ScrapedItem) {
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.record_item(item) {
                tracing::warn!(
                    "Sink {} failed to record item {} of {}: {}",
                    sink.name(),
                    item.position,
                    item.page_url,
                    e
                );
            }
        }
    }

    /// Resolves a follow-up request and queues it
    ///
    /// Unresolvable, offsite and duplicate targets are dropped.
    fn follow(
        &mut self,
        next: &FollowRequest,
        page_url: &Url,
        request: &QueuedRequest,
    ) -> Result<(), SpiderError> {
        let url = match next.resolve(page_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    "Dropping unresolvable next link {:?} on {}: {}",
                    next.target,
                    page_url,
                    e
                );
                return Ok(());
            }
        };

        let domain = match extract_domain(&url) {
            Some(domain) => domain,
            None => {
                tracing::debug!("Dropping next link without a host: {}", url);
                return Ok(());
            }
        };

        if !is_allowed_domain(&domain, &self.config.spider.allowed_domains) {
            tracing::debug!("Filtered offsite request to {}", url);
            self.report.offsite_filtered += 1;
            return Ok(());
        }

        if !self.scheduler.admit(&url) {
            return Ok(());
        }

        let depth = request.depth + 1;
        let page_id = self.lock_storage()?.insert_page(
            self.run_id,
            url.as_str(),
            &domain,
            depth,
            Some(page_url.as_str()),
        )?;

        self.scheduler.enqueue(QueuedRequest {
            url,
            domain,
            depth,
            referer: Some(page_url.to_string()),
            page_id,
        });

        Ok(())
    }

    /// Finalizes every sink, reporting the first failure
    fn finalize_sinks(&mut self, status: RunStatus) -> Result<(), SpiderError> {
        let mut first_error = None;
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.finalize(status) {
                tracing::error!("Failed to finalize sink {}: {}", sink.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Writes the markdown summary of this run
    fn write_summary(&self, path: &Path) -> Result<(), SpiderError> {
        let summary = {
            let storage = self.lock_storage()?;
            let run = storage.get_run(self.run_id)?;
            summarize_run(&*storage, &run)?
        };
        generate_markdown_summary(&summary, path)?;
        tracing::info!("Summary written to {}", path.display());
        Ok(())
    }

    fn set_state(
        &self,
        page_id: i64,
        state: PageState,
        status_code: Option<u16>,
        error_message: Option<&str>,
    ) -> Result<(), SpiderError> {
        let mut storage = self.lock_storage()?;
        storage.update_page_state(page_id, state, status_code, None, error_message)?;
        Ok(())
    }

    fn lock_storage(&self) -> Result<MutexGuard<'_, SqliteStorage>, SpiderError> {
        self.storage
            .lock()
            .map_err(|e| SpiderError::Storage(format!("Failed to lock storage: {}", e)))
    }
}

/// Runs a complete crawl and returns its report
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the database and record a new run
/// 2. Build the HTTP client
/// 3. Seed the frontier with the start URLs
/// 4. Fetch and parse pages, following next-page links
/// 5. Hand every scraped quote to the item sinks
/// 6. Mark the run completed and write the optional summary
///
/// # Example
///
/// ```no_run
/// use quotes_spider::config::load_config_with_hash;
/// use quotes_spider::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("quotes.toml"))?;
/// let report = crawl(config, &hash).await?;
/// println!("{} quotes", report.items_scraped);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, config_hash: &str) -> Result<CrawlReport, SpiderError> {
    let mut coordinator = Coordinator::new(config, config_hash)?;
    coordinator.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeedFormat, OutputConfig, SelectorConfig, SpiderConfig, UserAgentConfig};
    use crate::extract::NextLinkScope;
    use tempfile::TempDir;

    fn create_test_config(dir: &TempDir, start_urls: Vec<String>) -> Config {
        Config {
            spider: SpiderConfig {
                name: "quotes2".to_string(),
                start_urls,
                allowed_domains: vec![],
                max_pages: 0,
                download_delay: 0,
                obey_robots: false,
                next_link_scope: NextLinkScope::Page,
                retry_times: 0,
                retry_backoff: 0,
                request_timeout: 5,
            },
            user_agent: UserAgentConfig {
                crawler_name: "TestCrawler".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                database_path: dir.path().join("test.db").display().to_string(),
                feed_path: None,
                feed_format: FeedFormat::JsonLines,
                summary_path: None,
            },
            selectors: SelectorConfig::default(),
        }
    }

    #[test]
    fn test_coordinator_seeds_start_urls() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(
            &dir,
            vec![
                "http://quotes.toscrape.com/page/1/".to_string(),
                "http://QUOTES.toscrape.com/page/1/#dup".to_string(),
                "http://quotes.toscrape.com/tag/love/".to_string(),
            ],
        );

        let coordinator = Coordinator::new(config, "hash").unwrap();
        assert_eq!(coordinator.scheduler.frontier_size(), 2);
        assert_eq!(coordinator.scheduler.duplicates_filtered(), 1);

        let storage = coordinator.lock_storage().unwrap();
        let pages = storage.get_pages(coordinator.run_id()).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.state == PageState::Queued && p.depth == 0));

        let run = storage.get_run(coordinator.run_id()).unwrap();
        assert_eq!(run.spider_name, "quotes2");
        assert_eq!(run.config_hash, "hash");
    }

    #[test]
    fn test_follow_filters_offsite_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let mut config =
            create_test_config(&dir, vec!["http://quotes.toscrape.com/page/1/".to_string()]);
        config.spider.allowed_domains = vec!["quotes.toscrape.com".to_string()];

        let mut coordinator = Coordinator::new(config, "hash").unwrap();
        let page_url = Url::parse("http://quotes.toscrape.com/page/1/").unwrap();
        let request = QueuedRequest {
            url: page_url.clone(),
            domain: "quotes.toscrape.com".to_string(),
            depth: 0,
            referer: None,
            page_id: 1,
        };

        coordinator
            .follow(&FollowRequest::parse("/page/2/"), &page_url, &request)
            .unwrap();
        coordinator
            .follow(&FollowRequest::parse("/page/2/"), &page_url, &request)
            .unwrap();
        coordinator
            .follow(
                &FollowRequest::parse("http://elsewhere.example/page/3/"),
                &page_url,
                &request,
            )
            .unwrap();

        assert_eq!(coordinator.scheduler.frontier_size(), 2);
        assert_eq!(coordinator.scheduler.duplicates_filtered(), 1);
        assert_eq!(coordinator.report.offsite_filtered, 1);

        let storage = coordinator.lock_storage().unwrap();
        let page = storage
            .get_page_by_url(coordinator.run_id(), "http://quotes.toscrape.com/page/2/")
            .unwrap()
            .unwrap();
        assert_eq!(page.depth, 1);
        assert_eq!(
            page.referer.as_deref(),
            Some("http://quotes.toscrape.com/page/1/")
        );
    }

    #[test]
    fn test_unresolvable_next_link_is_dropped() {
        let dir = TempDir::new().unwrap();
        let config =
            create_test_config(&dir, vec!["http://quotes.toscrape.com/page/1/".to_string()]);

        let mut coordinator = Coordinator::new(config, "hash").unwrap();
        let page_url = Url::parse("http://quotes.toscrape.com/page/1/").unwrap();
        let request = QueuedRequest {
            url: page_url.clone(),
            domain: "quotes.toscrape.com".to_string(),
            depth: 0,
            referer: None,
            page_id: 1,
        };

        coordinator
            .follow(&FollowRequest::parse("http://[::1"), &page_url, &request)
            .unwrap();
        assert_eq!(coordinator.scheduler.frontier_size(), 1);
    }
}
