//! Page handlers
//!
//! Handlers turn parsed pages into work: chapter visits from the archive's chapter
//! list, and for each comic page one download plus at most one next-page visit.
//! They never touch the network or the frontier; the coordinator applies their
//! results.

use crate::config::Config;
use crate::crawler::parser::ComicPanel;
use crate::crawler::scheduler::QueuedVisit;
use crate::download::DownloadTask;
use crate::url::{build_next_url, page_number, resolve_reference};
use url::Url;

/// Next-page token meaning "last page of the chapter"
const LAST_PAGE_TOKEN: &str = "0";

/// A fetched comic page as the pagination chain sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    /// The page URL after redirects
    pub url: String,

    /// Page number recovered from the URL; 1 when it carries none, `None` when
    /// its digits do not fit a `u64`
    pub current_page: Option<u64>,

    /// Token of the following page as emitted by the page
    pub next_page_token: String,
}

impl PageRef {
    /// Builds a page reference, recovering the page number from `url`
    pub fn new(url: &str, next_page_token: &str) -> Self {
        Self {
            url: url.to_string(),
            current_page: page_number(url),
            next_page_token: next_page_token.to_string(),
        }
    }

    /// Returns true unless the token is empty or `"0"`
    pub fn has_next(&self) -> bool {
        !self.next_page_token.is_empty() && self.next_page_token != LAST_PAGE_TOKEN
    }
}

/// Work produced by one comic page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOutcome {
    /// Image to download
    pub download: Option<DownloadTask>,

    /// Image reference that could not be turned into a download
    pub rejected_image: Option<String>,

    /// Next page of the same chapter
    pub next_visit: Option<QueuedVisit>,
}

/// Fans the archive's chapter links out into chapter visits
pub fn handle_chapter_list(links: &[Url]) -> Vec<QueuedVisit> {
    links
        .iter()
        .map(|link| {
            tracing::info!("Found chapter {}", link);
            QueuedVisit::chapter(link.clone())
        })
        .collect()
}

/// Turns comic page panels into downloads and next-page visits
#[derive(Debug, Clone)]
pub struct PageHandler {
    empty_label: String,
    max_pages_per_chapter: u32,
}

impl PageHandler {
    /// Creates a handler from the crawl configuration
    pub fn new(config: &Config) -> Self {
        Self {
            empty_label: config.output.empty_label.clone(),
            max_pages_per_chapter: config.crawler.max_pages_per_chapter,
        }
    }

    /// Handles one comic page panel
    ///
    /// # Arguments
    ///
    /// * `visit` - The frontier entry that produced the page
    /// * `page_url` - The URL the page was served from
    /// * `panel` - Fields read from the page
    ///
    /// A panel without an image reference produces nothing: no download and no
    /// next-page visit.
    pub fn handle(&self, visit: &QueuedVisit, page_url: &Url, panel: &ComicPanel) -> PageOutcome {
        let chapter_dir = chapter_label(&panel.heading, &self.empty_label);
        tracing::debug!("Chapter: {}", chapter_dir);

        if panel.image_src.is_empty() {
            tracing::debug!("No image on {}, skipping page", page_url);
            return PageOutcome::default();
        }

        let page = PageRef::new(page_url.as_str(), &panel.next_page_token);
        tracing::info!(
            "Page {} of '{}': image {}, next '{}'",
            page.url,
            chapter_dir,
            panel.image_src,
            page.next_page_token
        );

        let (download, rejected_image) =
            match self.download_task(&page, page_url, panel, chapter_dir) {
                Some(task) => (Some(task), None),
                None => (None, Some(panel.image_src.clone())),
            };

        PageOutcome {
            download,
            rejected_image,
            next_visit: self.next_visit(visit, &page),
        }
    }

    /// Builds the download for a page image, or logs why there is none
    fn download_task(
        &self,
        page: &PageRef,
        page_url: &Url,
        panel: &ComicPanel,
        chapter_dir: String,
    ) -> Option<DownloadTask> {
        let Some(current_page) = page.current_page else {
            tracing::error!(
                "Page number of {} is out of range, not saving image '{}'",
                page_url,
                panel.image_src
            );
            return None;
        };

        let Some(image_url) = resolve_reference(&panel.image_src, page_url) else {
            tracing::error!(
                "Unusable image reference '{}' on {}",
                panel.image_src,
                page_url
            );
            return None;
        };

        Some(DownloadTask {
            image_url,
            chapter_dir,
            page_index: current_page.to_string(),
        })
    }

    /// Derives the next page of the chain, if any
    fn next_visit(&self, visit: &QueuedVisit, page: &PageRef) -> Option<QueuedVisit> {
        if !page.has_next() {
            return None;
        }

        if visit.chain_position >= self.max_pages_per_chapter {
            tracing::warn!(
                "Chapter chain reached {} pages at {}, not following '{}'",
                self.max_pages_per_chapter,
                page.url,
                page.next_page_token
            );
            return None;
        }

        let Some(next_url) = build_next_url(&page.url, &page.next_page_token) else {
            tracing::warn!(
                "Cannot derive next page '{}' from {}",
                page.next_page_token,
                page.url
            );
            return None;
        };

        match Url::parse(&next_url) {
            Ok(url) => {
                tracing::info!("Next page: {}", url);
                Some(visit.next_in_chain(url))
            }
            Err(e) => {
                tracing::warn!("Derived next page {} is not a URL: {}", next_url, e);
                None
            }
        }
    }
}

/// Directory name for a chapter heading
///
/// Blank headings and the special names `.` and `..` use `empty_label`; path
/// separators are replaced with `_` so the directory stays under the output root.
pub fn chapter_label(heading: &str, empty_label: &str) -> String {
    let heading = heading.trim();
    if heading.is_empty() || heading == "." || heading == ".." {
        return empty_label.to_string();
    }

    heading.replace(['/', '\\'], "_")
}
