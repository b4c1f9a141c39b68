//! HTTP fetcher implementation
//!
//! This module handles the HTTP side of the crawl:
//! - Building HTTP clients for pages and images
//! - GET requests for archive and chapter pages
//! - Error classification for the crawl log
//!
//! No retries and no request timeouts: a failed page is logged and abandoned.

use crate::config::CrawlerConfig;
use reqwest::Client;

/// Result of a page fetch
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, reset, body read failure)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns true for a page that can be handed to the page handlers
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds the HTTP client used for page requests
///
/// Redirects are followed. The configured User-Agent, if any, is sent with every
/// page request.
///
/// # Example
///
/// ```no_run
/// use comic_ripple::config::CrawlerConfig;
/// use comic_ripple::crawler::build_http_client;
///
/// let config = CrawlerConfig {
///     domain_glob: "*manhuadb*".to_string(),
///     parallelism: 2,
///     delay_ms: 500,
///     random_delay_ms: 1000,
///     max_pages_per_chapter: 500,
///     max_concurrent_downloads: None,
///     user_agent: Some("ComicRipple/1.0".to_string()),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().gzip(true).brotli(true);

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    builder.build()
}

/// Builds the HTTP client used for image downloads
///
/// Plain GETs: no User-Agent override, no custom headers.
pub fn build_image_client() -> Result<Client, reqwest::Error> {
    Client::builder().gzip(true).brotli(true).build()
}

/// Fetches a page and classifies the outcome
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// A FetchResult indicating success or the type of failure
pub async fn fetch_page(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            if e.is_connect() {
                FetchResult::NetworkError {
                    error: format!("Connection failed: {}", e),
                }
            } else {
                FetchResult::NetworkError {
                    error: e.to_string(),
                }
            }
        }
    }
}
