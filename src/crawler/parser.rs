//! HTML parser for archive and chapter pages
//!
//! This module runs the configured selectors over a fetched page and extracts:
//! - Chapter links from the archive's chapter tab
//! - Per comic panel: chapter heading, image reference and next-page token
//!
//! Values are returned raw; deciding what they mean is left to the page handlers.

use crate::config::SelectorConfig;
use crate::url::resolve_reference;
use crate::RippleError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled selectors for one archive
#[derive(Debug, Clone)]
pub struct PageSelectors {
    chapter_list: Selector,
    page_container: Selector,
    chapter_heading: Selector,
    image: Selector,
    image_attr: String,
    next_page: Selector,
    next_page_attr: String,
}

impl PageSelectors {
    /// Compiles the configured selectors, scoping the chapter list to `tab_id`
    pub fn from_config(config: &SelectorConfig, tab_id: &str) -> Result<Self, RippleError> {
        Ok(Self {
            chapter_list: compile(&config.scoped_chapter_list(tab_id))?,
            page_container: compile(&config.page_container)?,
            chapter_heading: compile(&config.chapter_heading)?,
            image: compile(&config.image)?,
            image_attr: config.image_attr.clone(),
            next_page: compile(&config.next_page)?,
            next_page_attr: config.next_page_attr.clone(),
        })
    }
}

fn compile(selector: &str) -> Result<Selector, RippleError> {
    Selector::parse(selector).map_err(|e| RippleError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Raw fields read from one comic page container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComicPanel {
    /// Chapter heading text, trimmed
    pub heading: String,

    /// Image reference as written in the markup, trimmed
    pub image_src: String,

    /// Next-page token; empty when the attribute is absent
    pub next_page_token: String,
}

/// Everything the page handlers need from one fetched page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Absolute chapter links found in the chapter tab
    pub chapter_links: Vec<Url>,

    /// One entry per page container on the page
    pub panels: Vec<ComicPanel>,
}

/// Parses HTML content with the archive selectors
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The page URL, used to resolve relative chapter links
/// * `selectors` - The compiled archive selectors
///
/// # Example
///
/// ```no_run
/// use comic_ripple::config::SelectorConfig;
/// use comic_ripple::crawler::{parse_page, PageSelectors};
/// use url::Url;
///
/// let selectors = PageSelectors::from_config(&SelectorConfig::default(), "1330").unwrap();
/// let html = r#"<div class="tab-pane" id="1330"><ol class="links-of-books num_div">
///     <li><a href="/manhua/147/1330_1.html">1</a></li></ol></div>"#;
/// let base_url = Url::parse("https://www.manhuadb.com/manhua/147").unwrap();
/// let parsed = parse_page(html, &base_url, &selectors);
/// assert_eq!(parsed.chapter_links.len(), 1);
/// ```
pub fn parse_page(html: &str, base_url: &Url, selectors: &PageSelectors) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        chapter_links: extract_chapter_links(&document, base_url, selectors),
        panels: extract_panels(&document, selectors),
    }
}

/// Extracts the chapter links of the configured tab
fn extract_chapter_links(document: &Html, base_url: &Url, selectors: &PageSelectors) -> Vec<Url> {
    let mut links = Vec::new();

    for element in document.select(&selectors.chapter_list) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match resolve_reference(href, base_url) {
            Some(link) => links.push(link),
            None => tracing::debug!("Skipping chapter link '{}' on {}", href, base_url),
        }
    }

    links
}

/// Extracts one [`ComicPanel`] per page container
fn extract_panels(document: &Html, selectors: &PageSelectors) -> Vec<ComicPanel> {
    document
        .select(&selectors.page_container)
        .map(|container| ComicPanel {
            heading: child_text(&container, &selectors.chapter_heading),
            image_src: child_attr(&container, &selectors.image, &selectors.image_attr),
            next_page_token: child_attr(
                &container,
                &selectors.next_page,
                &selectors.next_page_attr,
            ),
        })
        .collect()
}

/// Concatenated text of every matching descendant, trimmed
fn child_text(container: &ElementRef<'_>, selector: &Selector) -> String {
    container
        .select(selector)
        .flat_map(|element| element.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Attribute of the first matching descendant, trimmed; empty if absent
fn child_attr(container: &ElementRef<'_>, selector: &Selector, attr: &str) -> String {
    container
        .select(selector)
        .find_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}
