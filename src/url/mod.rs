//! URL handling module for Comic-Ripple
//!
//! This module provides the page URL codec used to walk a chapter's pagination
//! chain and the host glob matching behind the crawl rate limit.

mod matcher;
mod page;

pub use matcher::matches_glob;
pub use page::{build_next_url, extract_current_page, page_number, FIRST_PAGE};

use url::Url;

/// Returns true if the URL's host matches the domain glob
///
/// URLs without a host never match.
pub fn host_matches(url: &Url, domain_glob: &str) -> bool {
    url.host_str()
        .map(|host| matches_glob(domain_glob, host))
        .unwrap_or(false)
}

/// Resolves a possibly relative reference against the page it was found on
///
/// Only http and https results are accepted; empty references resolve to `None`.
pub fn resolve_reference(reference: &str, base_url: &Url) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    match base_url.join(reference) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}
