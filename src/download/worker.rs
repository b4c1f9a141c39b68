//! Image download worker
//!
//! Fetches one page image and writes it to `<output>/<chapter>/<page>.<ext>`.

use crate::download::tracker::{CompletionTracker, TaskGuard};
use crate::RippleError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use url::Url;

/// Extension used when the image URL does not name one
pub const DEFAULT_EXTENSION: &str = "jpg";

#[cfg(unix)]
const DIR_MODE: u32 = 0o777;
#[cfg(unix)]
const FILE_MODE: u32 = 0o666;

/// One image to fetch and persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Absolute image URL
    pub image_url: Url,

    /// Chapter directory name
    pub chapter_dir: String,

    /// Page number rendered as the file stem
    pub page_index: String,
}

impl DownloadTask {
    /// File extension taken from the last path segment of the image URL
    pub fn extension(&self) -> &str {
        image_extension(&self.image_url)
    }

    /// Where this image is written under `output_root`
    pub fn target_path(&self, output_root: &Path) -> PathBuf {
        output_root
            .join(&self.chapter_dir)
            .join(format!("{}.{}", self.page_index, self.extension()))
    }
}

/// Returns the text after the last dot of the URL's final path segment
///
/// Query and fragment are ignored. Falls back to [`DEFAULT_EXTENSION`] when the
/// segment has no dot or nothing follows it.
pub fn image_extension(image_url: &Url) -> &str {
    let segment = image_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => DEFAULT_EXTENSION,
    }
}

/// Download counters shared between all workers
#[derive(Debug, Default)]
pub struct DownloadCounters {
    saved: AtomicU64,
    failed: AtomicU64,
}

impl DownloadCounters {
    /// Images written to disk
    pub fn saved(&self) -> u64 {
        self.saved.load(Ordering::Relaxed)
    }

    /// Downloads that ended in a fetch or filesystem error
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Dispatches download tasks onto the runtime
///
/// Dispatch never waits: each task is spawned immediately and, when a download cap
/// is configured, queues for a permit inside its own task.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    output_root: PathBuf,
    tracker: CompletionTracker,
    limit: Option<Arc<Semaphore>>,
    counters: Arc<DownloadCounters>,
}

impl Downloader {
    /// Creates a downloader writing under `output_root`
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for image requests
    /// * `output_root` - Directory holding the chapter directories
    /// * `tracker` - Tracker every dispatched task registers with
    /// * `max_concurrent` - Optional cap on simultaneous downloads
    pub fn new(
        client: Client,
        output_root: PathBuf,
        tracker: CompletionTracker,
        max_concurrent: Option<usize>,
    ) -> Self {
        Self {
            client,
            output_root,
            tracker,
            limit: max_concurrent.map(|permits| Arc::new(Semaphore::new(permits))),
            counters: Arc::new(DownloadCounters::default()),
        }
    }

    /// The tracker gating process exit
    pub fn tracker(&self) -> &CompletionTracker {
        &self.tracker
    }

    /// Shared success/failure counters
    pub fn counters(&self) -> &DownloadCounters {
        &self.counters
    }

    /// Counts an image reference that never became a task as a failed download
    pub fn record_rejected(&self) {
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Registers the task with the tracker, then spawns it
    pub fn dispatch(&self, task: DownloadTask) {
        let guard = self.tracker.register();
        let worker = self.clone();
        tokio::spawn(async move { worker.run(task, guard).await });
    }

    async fn run(&self, task: DownloadTask, _guard: TaskGuard) {
        let _permit = match &self.limit {
            Some(limit) => match Arc::clone(limit).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => return,
            },
            None => None,
        };

        match download_image(&self.client, &task, &self.output_root).await {
            Ok(path) => {
                self.counters.saved.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Saved {} -> {}", task.image_url, path.display());
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Download of {} failed: {}", task.image_url, e);
            }
        }
    }
}

/// Fetches one image and writes it to its target path
///
/// A failure to create the chapter directory is logged and the write is still
/// attempted; the write then reports the real error. An existing file at the
/// target path is overwritten.
///
/// # Returns
///
/// * `Ok(PathBuf)` - The path the image was written to
/// * `Err(RippleError)` - The fetch, body read, or write failed
pub async fn download_image(
    client: &Client,
    task: &DownloadTask,
    output_root: &Path,
) -> Result<PathBuf, RippleError> {
    tracing::debug!(
        "Downloading {} as {}/{}",
        task.image_url,
        task.chapter_dir,
        task.page_index
    );

    let response = client
        .get(task.image_url.clone())
        .send()
        .await
        .map_err(|source| RippleError::Http {
            url: task.image_url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RippleError::HttpStatus {
            url: task.image_url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|source| RippleError::Http {
        url: task.image_url.to_string(),
        source,
    })?;

    let chapter_dir = output_root.join(&task.chapter_dir);
    if let Err(e) = create_chapter_dir(&chapter_dir).await {
        tracing::warn!(
            "Failed to create directory {}: {}",
            chapter_dir.display(),
            e
        );
    }

    let path = task.target_path(output_root);
    write_image(&path, &body)
        .await
        .map_err(|source| RippleError::Io {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}

async fn create_chapter_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(dir).await
}

async fn write_image(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(body).await?;
    file.flush().await
}
