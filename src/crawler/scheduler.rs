//! Scheduler for managing the crawl frontier and rate limiting
//!
//! This module handles:
//! - The FIFO frontier of pages waiting to be fetched
//! - Refusing URLs that were already scheduled once
//! - Global concurrency limiting via a semaphore
//! - The rate limit shared by every host matching the domain glob:
//!   a base delay plus random jitter between consecutive requests

use crate::config::CrawlerConfig;
use crate::url::host_matches;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use url::Url;

/// A page waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedVisit {
    /// The URL to fetch
    pub url: Url,

    /// Position in its chapter's pagination chain; 0 for archive pages
    pub chain_position: u32,
}

impl QueuedVisit {
    /// An archive index page
    pub fn archive(url: Url) -> Self {
        Self {
            url,
            chain_position: 0,
        }
    }

    /// The first page of a chapter
    pub fn chapter(url: Url) -> Self {
        Self {
            url,
            chain_position: 1,
        }
    }

    /// The page following `self` in the same chapter
    pub fn next_in_chain(&self, url: Url) -> Self {
        Self {
            url,
            chain_position: self.chain_position.saturating_add(1),
        }
    }
}

/// A visit cleared to run, holding its concurrency permit
pub struct ScheduledVisit {
    /// The page to fetch
    pub visit: QueuedVisit,

    /// Released when the fetch task drops it
    pub _permit: OwnedSemaphorePermit,
}

/// Delay policy for hosts matching the domain glob
#[derive(Debug, Clone)]
pub struct RateLimit {
    domain_glob: String,
    delay: Duration,
    random_delay: Duration,
}

impl RateLimit {
    /// Builds the rate limit from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            domain_glob: config.domain_glob.clone(),
            delay: Duration::from_millis(config.delay_ms),
            random_delay: Duration::from_millis(config.random_delay_ms),
        }
    }

    /// Returns true if requests to this URL are rate limited
    pub fn applies_to(&self, url: &Url) -> bool {
        host_matches(url, &self.domain_glob)
    }

    /// Gap to leave after a request: base delay plus jitter in `[0, random_delay)`
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.random_delay.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }

        self.delay + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
    }
}

/// Scheduler manages the frontier queue and rate limiting
///
/// The scheduler coordinates:
/// - Global concurrency limits (parallelism)
/// - The rate-limit group (minimum gap plus jitter between requests)
/// - First-in first-out selection from the frontier
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    global_semaphore: Arc<Semaphore>,

    /// Pages waiting to be fetched
    frontier: VecDeque<QueuedVisit>,

    /// Every URL ever enqueued
    seen: HashSet<String>,

    /// Delay policy for matching hosts
    rate_limit: RateLimit,

    /// Earliest moment the next rate-limited request may start
    next_slot: Option<Instant>,
}

impl Scheduler {
    /// Creates a new scheduler with an empty frontier
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            global_semaphore: Arc::new(Semaphore::new(config.parallelism as usize)),
            frontier: VecDeque::new(),
            seen: HashSet::new(),
            rate_limit: RateLimit::from_config(config),
            next_slot: None,
        }
    }

    /// Adds a page to the frontier
    ///
    /// # Returns
    ///
    /// * `true` - The page was queued
    /// * `false` - The URL was scheduled before and is skipped
    pub fn enqueue(&mut self, visit: QueuedVisit) -> bool {
        if !self.seen.insert(visit.url.as_str().to_string()) {
            tracing::debug!("Already scheduled, skipping {}", visit.url);
            return false;
        }

        self.frontier.push_back(visit);
        true
    }

    /// Gets the next page to fetch
    ///
    /// Waits for a concurrency permit and, for rate-limited hosts, for the next
    /// free slot. Nothing is removed from the frontier until both are available, so
    /// dropping the returned future loses no work.
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledVisit)` - A page that's ready to fetch
    /// * `None` - The frontier is empty
    pub async fn next_visit(&mut self) -> Option<ScheduledVisit> {
        let limited = self.rate_limit.applies_to(&self.frontier.front()?.url);

        let permit = self.global_semaphore.clone().acquire_owned().await.ok()?;

        if limited {
            if let Some(ready_at) = self.next_slot {
                if ready_at > Instant::now() {
                    tracing::trace!(
                        "Rate limited, waiting {:?}",
                        ready_at - Instant::now()
                    );
                    tokio::time::sleep_until(ready_at).await;
                }
            }
        }

        let visit = self.frontier.pop_front()?;

        if limited {
            self.next_slot = Some(Instant::now() + self.rate_limit.next_delay());
        }

        tracing::debug!("Scheduling {}", visit.url);
        Some(ScheduledVisit {
            visit,
            _permit: permit,
        })
    }

    /// Returns the number of pages in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config(delay_ms: u64, random_delay_ms: u64) -> CrawlerConfig {
        CrawlerConfig {
            domain_glob: "*example*".to_string(),
            parallelism: 2,
            delay_ms,
            random_delay_ms,
            max_pages_per_chapter: 10,
            max_concurrent_downloads: None,
            user_agent: None,
        }
    }

    fn visit(url: &str) -> QueuedVisit {
        QueuedVisit::chapter(Url::parse(url).unwrap())
    }

    #[test]
    fn test_new_scheduler() {
        let scheduler = Scheduler::new(&create_test_config(0, 0));
        assert_eq!(scheduler.frontier_size(), 0);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_enqueue_refuses_repeat_urls() {
        let mut scheduler = Scheduler::new(&create_test_config(0, 0));

        assert!(scheduler.enqueue(visit("https://example.com/a.html")));
        assert!(scheduler.enqueue(visit("https://example.com/a_p2.html")));
        assert!(!scheduler.enqueue(visit("https://example.com/a.html")));

        assert_eq!(scheduler.frontier_size(), 2);
    }

    #[test]
    fn test_chain_positions() {
        let url = Url::parse("https://example.com/a.html").unwrap();
        let archive = QueuedVisit::archive(url.clone());
        let first = QueuedVisit::chapter(url.clone());
        let second = first.next_in_chain(url);

        assert_eq!(archive.chain_position, 0);
        assert_eq!(first.chain_position, 1);
        assert_eq!(second.chain_position, 2);
    }

    #[tokio::test]
    async fn test_next_visit_is_fifo() {
        let mut scheduler = Scheduler::new(&create_test_config(0, 0));
        scheduler.enqueue(visit("https://example.com/1.html"));
        scheduler.enqueue(visit("https://example.com/2.html"));

        let first = scheduler.next_visit().await.unwrap();
        let second = scheduler.next_visit().await.unwrap();

        assert_eq!(first.visit.url.as_str(), "https://example.com/1.html");
        assert_eq!(second.visit.url.as_str(), "https://example.com/2.html");
        assert!(scheduler.is_empty());
    }

    #[tokio::test]
    async fn test_next_visit_empty_frontier() {
        let mut scheduler = Scheduler::new(&create_test_config(0, 0));
        assert!(scheduler.next_visit().await.is_none());
    }

    #[tokio::test]
    async fn test_parallelism_holds_back_visits() {
        let mut scheduler = Scheduler::new(&create_test_config(0, 0));
        for i in 0..3 {
            scheduler.enqueue(visit(&format!("https://example.com/{}.html", i)));
        }

        let first = scheduler.next_visit().await.unwrap();
        let _second = scheduler.next_visit().await.unwrap();

        // Both permits are held
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), scheduler.next_visit()).await;
        assert!(blocked.is_err());
        assert_eq!(scheduler.frontier_size(), 1);

        drop(first);
        let third = scheduler.next_visit().await.unwrap();
        assert_eq!(third.visit.url.as_str(), "https://example.com/2.html");
    }

    #[tokio::test]
    async fn test_rate_limit_spaces_matching_requests() {
        let mut scheduler = Scheduler::new(&create_test_config(80, 0));
        scheduler.enqueue(visit("https://example.com/1.html"));
        scheduler.enqueue(visit("https://example.com/2.html"));

        let start = Instant::now();
        drop(scheduler.next_visit().await.unwrap());
        drop(scheduler.next_visit().await.unwrap());

        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_unmatched_hosts_are_not_delayed() {
        let mut scheduler = Scheduler::new(&create_test_config(5_000, 0));
        scheduler.enqueue(visit("https://other.org/1.html"));
        scheduler.enqueue(visit("https://other.org/2.html"));

        let start = Instant::now();
        drop(scheduler.next_visit().await.unwrap());
        drop(scheduler.next_visit().await.unwrap());

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_next_delay_within_jitter_window() {
        let limit = RateLimit::from_config(&create_test_config(100, 50));
        for _ in 0..100 {
            let delay = limit.next_delay();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay < Duration::from_millis(150));
        }
    }

    #[test]
    fn test_next_delay_without_jitter() {
        let limit = RateLimit::from_config(&create_test_config(250, 0));
        assert_eq!(limit.next_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_rate_limit_applies_to_glob() {
        let limit = RateLimit::from_config(&create_test_config(0, 0));
        assert!(limit.applies_to(&Url::parse("https://www.example.com/").unwrap()));
        assert!(!limit.applies_to(&Url::parse("https://other.org/").unwrap()));
    }
}
