//! Page URL codec
//!
//! Chapter pages are addressed as `<slug>.html` for the first page and
//! `<slug>_p<N>.html` for every following page. These functions translate between
//! a page URL and its page number without touching the network.

use regex::Regex;
use std::sync::OnceLock;

/// Page number assumed when a URL carries no `_p<N>.html` suffix
pub const FIRST_PAGE: u64 = 1;

fn page_suffix() -> &'static Regex {
    static PAGE_SUFFIX: OnceLock<Regex> = OnceLock::new();
    PAGE_SUFFIX.get_or_init(|| Regex::new(r"_p(\d+)\.html").expect("page suffix pattern"))
}

/// Reads the page number encoded in a chapter page URL
///
/// Looks for the first `_p<digits>.html` in the URL. A URL without one is the
/// first page of its chapter. Returns `None` when the digits do not fit a `u64`,
/// since no page number can be trusted for such a URL.
pub fn page_number(url: &str) -> Option<u64> {
    match page_suffix().captures(url).and_then(|caps| caps.get(1)) {
        Some(digits) => digits.as_str().parse().ok(),
        None => Some(FIRST_PAGE),
    }
}

/// Extracts the page number encoded in a chapter page URL
///
/// Same as [`page_number`], with an unreadable number also mapping to page 1.
///
/// # Examples
///
/// ```
/// use comic_ripple::url::extract_current_page;
///
/// assert_eq!(extract_current_page("https://x/foo_p3.html"), 3);
/// assert_eq!(extract_current_page("https://x/foo.html"), 1);
/// ```
pub fn extract_current_page(url: &str) -> u64 {
    page_number(url).unwrap_or(FIRST_PAGE)
}

/// Builds the URL of the page identified by `next_page_token`
///
/// When the URL path already ends in `_p<N>.html` the suffix is replaced with
/// `_p<token>.html`. Otherwise `_p<token>` is inserted before the extension of the
/// last path segment. Query and fragment are carried over unchanged. Returns
/// `None` when the path has neither shape, e.g. when its last segment has no
/// extension.
///
/// # Examples
///
/// ```
/// use comic_ripple::url::build_next_url;
///
/// assert_eq!(
///     build_next_url("https://x/foo.html", "2").as_deref(),
///     Some("https://x/foo_p2.html")
/// );
/// assert_eq!(
///     build_next_url("https://x/foo_p2.html", "3").as_deref(),
///     Some("https://x/foo_p3.html")
/// );
/// assert_eq!(build_next_url("https://x/foo", "2"), None);
/// ```
pub fn build_next_url(current_url: &str, next_page_token: &str) -> Option<String> {
    let split = current_url
        .find(|c: char| c == '?' || c == '#')
        .unwrap_or(current_url.len());
    let (address, tail) = current_url.split_at(split);
    let path_start = path_start(address)?;
    let path = &address[path_start..];

    if let Some(found) = page_suffix().find_iter(path).last() {
        if found.end() == path.len() {
            return Some(format!(
                "{}_p{}.html{}",
                &address[..path_start + found.start()],
                next_page_token,
                tail
            ));
        }
    }

    let segment_start = path.rfind('/').map_or(0, |slash| slash + 1);
    let dot = match path[segment_start..].rfind('.') {
        // A leading dot is a hidden name, not an extension
        None | Some(0) => return None,
        Some(dot) => path_start + segment_start + dot,
    };

    Some(format!(
        "{}_p{}{}{}",
        &address[..dot],
        next_page_token,
        &address[dot..],
        tail
    ))
}

/// Byte offset of the path: after `scheme://authority`, or 0 for a bare path
fn path_start(address: &str) -> Option<usize> {
    match address.find("://") {
        Some(scheme_end) => {
            let authority = scheme_end + 3;
            address[authority..].find('/').map(|slash| authority + slash)
        }
        None => Some(0),
    }
}
