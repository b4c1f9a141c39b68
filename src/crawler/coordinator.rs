//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the driver loop that coordinates the crawl:
//! - Seeding the frontier with the archive pages
//! - Keeping up to `parallelism` page fetches in flight
//! - Handing fetched pages to the page handlers
//! - Queueing next-page visits and dispatching image downloads
//! - Waiting for the frontier to drain and every download to finish

use crate::config::Config;
use crate::crawler::handler::{handle_chapter_list, PageHandler};
use crate::crawler::parser::{parse_page, PageSelectors};
use crate::crawler::scheduler::{QueuedVisit, ScheduledVisit, Scheduler};
use crate::crawler::stats::CrawlStats;
use crate::crawler::{build_http_client, build_image_client, fetch_page, FetchResult};
use crate::download::{CompletionTracker, Downloader};
use crate::RippleError;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    scheduler: Scheduler,
    client: Client,
    selectors: PageSelectors,
    handler: PageHandler,
    downloader: Downloader,
    stats: CrawlStats,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(RippleError)` - A selector, start URL, or HTTP client failed to build
    pub fn new(config: Config) -> Result<Self, RippleError> {
        let selectors = PageSelectors::from_config(&config.selectors, &config.archive.tab_id)?;
        let client = build_http_client(&config.crawler)?;

        let downloader = Downloader::new(
            build_image_client()?,
            PathBuf::from(&config.output.directory),
            CompletionTracker::new(),
            config.crawler.max_concurrent_downloads,
        );

        let mut scheduler = Scheduler::new(&config.crawler);
        for start_url in &config.archive.start_urls {
            scheduler.enqueue(QueuedVisit::archive(Url::parse(start_url)?));
        }

        Ok(Self {
            handler: PageHandler::new(&config),
            config,
            scheduler,
            client,
            selectors,
            downloader,
            stats: CrawlStats::default(),
        })
    }

    /// Runs the crawl to completion
    ///
    /// Returns once the frontier is drained, no page fetch is in flight, and every
    /// dispatched download has finished. Page and download failures are logged and
    /// counted, never returned.
    pub async fn run(&mut self) -> Result<CrawlStats, RippleError> {
        tracing::info!(
            "Starting crawl of {} archive page(s), tab {}",
            self.config.archive.start_urls.len(),
            self.config.archive.tab_id
        );

        let start_time = Instant::now();
        let mut in_flight: JoinSet<(QueuedVisit, FetchResult)> = JoinSet::new();

        loop {
            if self.scheduler.is_empty() && in_flight.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            tokio::select! {
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    match joined {
                        Ok((visit, result)) => self.handle_fetched(&visit, result),
                        Err(e) => {
                            self.stats.pages_failed += 1;
                            tracing::error!("Page task failed: {}", e);
                        }
                    }
                }
                Some(scheduled) = self.scheduler.next_visit(), if !self.scheduler.is_empty() => {
                    let client = self.client.clone();
                    in_flight.spawn(async move {
                        let ScheduledVisit { visit, _permit } = scheduled;
                        tracing::info!("Visiting {}", visit.url);
                        let result = fetch_page(&client, visit.url.as_str()).await;
                        (visit, result)
                    });
                }
                else => break,
            }
        }

        let outstanding = self.downloader.tracker().outstanding();
        if outstanding > 0 {
            tracing::info!("Waiting for {} download(s) to finish", outstanding);
        }
        self.downloader.tracker().wait().await;

        self.stats.images_saved = self.downloader.counters().saved();
        self.stats.downloads_failed = self.downloader.counters().failed();

        tracing::info!(
            "Crawl completed in {:?}: {}",
            start_time.elapsed(),
            self.stats
        );

        Ok(self.stats.clone())
    }

    /// Applies the page handlers to one fetch result
    fn handle_fetched(&mut self, visit: &QueuedVisit, result: FetchResult) {
        let (final_url, body) = match result {
            FetchResult::Success {
                final_url,
                status_code,
                body,
            } => {
                tracing::debug!("Fetched {} ({})", final_url, status_code);
                (final_url, body)
            }
            FetchResult::HttpError { status_code } => {
                self.stats.pages_failed += 1;
                tracing::error!("Response error for {}: HTTP {}", visit.url, status_code);
                return;
            }
            FetchResult::NetworkError { error } => {
                self.stats.pages_failed += 1;
                tracing::error!("Response error for {}: {}", visit.url, error);
                return;
            }
        };

        self.stats.pages_visited += 1;
        let page_url = Url::parse(&final_url).unwrap_or_else(|_| visit.url.clone());
        let parsed = parse_page(&body, &page_url, &self.selectors);

        for chapter in handle_chapter_list(&parsed.chapter_links) {
            if self.scheduler.enqueue(chapter) {
                self.stats.chapters_queued += 1;
            }
        }

        for panel in &parsed.panels {
            let outcome = self.handler.handle(visit, &page_url, panel);

            if let Some(task) = outcome.download {
                self.stats.images_found += 1;
                self.downloader.dispatch(task);
            }

            if outcome.rejected_image.is_some() {
                self.stats.images_found += 1;
                self.downloader.record_rejected();
            }

            if let Some(next) = outcome.next_visit {
                self.scheduler.enqueue(next);
            }
        }

        if self.stats.pages_visited % 10 == 0 {
            tracing::info!(
                "Progress: {} pages visited, {} in frontier, {} downloads outstanding",
                self.stats.pages_visited,
                self.scheduler.frontier_size(),
                self.downloader.tracker().outstanding()
            );
        }
    }
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use comic_ripple::config::load_config;
/// use comic_ripple::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("archive.toml"))?;
/// let stats = run_crawl(config).await?;
/// println!("{}", stats);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlStats, RippleError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
