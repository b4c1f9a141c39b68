//! Download pipeline
//!
//! Page handlers turn each comic page into a [`DownloadTask`]; the [`Downloader`]
//! runs those tasks concurrently with the crawl and the [`CompletionTracker`] holds
//! the process open until the last image has been written.

mod tracker;
mod worker;

pub use tracker::{CompletionTracker, TaskGuard};
pub use worker::{
    download_image, image_extension, DownloadCounters, DownloadTask, Downloader,
    DEFAULT_EXTENSION,
};
