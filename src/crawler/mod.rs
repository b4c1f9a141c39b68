//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of archive and chapter pages
//! - HTML parsing with the configured selectors
//! - Page handlers for chapter lists and comic pages
//! - Request scheduling and rate limiting
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod handler;
mod parser;
mod scheduler;
mod stats;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, build_image_client, fetch_page, FetchResult};
pub use handler::{chapter_label, handle_chapter_list, PageHandler, PageOutcome, PageRef};
pub use parser::{parse_page, ComicPanel, PageSelectors, ParsedPage};
pub use scheduler::{QueuedVisit, RateLimit, ScheduledVisit, Scheduler};
pub use stats::CrawlStats;
