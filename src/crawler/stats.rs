//! Crawl statistics

use std::fmt;

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Pages fetched and handed to the page handlers
    pub pages_visited: u64,

    /// Pages that failed to fetch
    pub pages_failed: u64,

    /// Chapter links newly queued from chapter lists
    pub chapters_queued: u64,

    /// Image references found on comic pages
    pub images_found: u64,

    /// Images written to disk
    pub images_saved: u64,

    /// Image references that ended in an error, including ones never dispatched
    pub downloads_failed: u64,
}

impl CrawlStats {
    /// Every image reference found was either saved or counted as failed
    pub fn downloads_settled(&self) -> bool {
        self.images_saved + self.downloads_failed == self.images_found
    }
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages visited ({} failed), {} chapters, {} images saved, {} downloads failed",
            self.pages_visited,
            self.pages_failed,
            self.chapters_queued,
            self.images_saved,
            self.downloads_failed
        )
    }
}
