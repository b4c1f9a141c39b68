use serde::Deserialize;

/// Main configuration structure for Comic-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl scheduling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Glob matched against URL hosts; matching hosts share one rate-limit group
    #[serde(rename = "domain-glob")]
    pub domain_glob: String,

    /// Maximum number of page fetches in flight at once
    pub parallelism: u32,

    /// Base delay between requests to the rate-limited domain (milliseconds)
    #[serde(rename = "delay-ms", default)]
    pub delay_ms: u64,

    /// Upper bound of the random delay added on top of `delay-ms` (milliseconds)
    #[serde(rename = "random-delay-ms", default)]
    pub random_delay_ms: u64,

    /// Longest next-page chain followed for a single chapter
    #[serde(
        rename = "max-pages-per-chapter",
        default = "default_max_pages_per_chapter"
    )]
    pub max_pages_per_chapter: u32,

    /// Cap on simultaneous image downloads; unbounded when absent
    #[serde(rename = "max-concurrent-downloads", default)]
    pub max_concurrent_downloads: Option<usize>,

    /// User-Agent sent with page requests
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,
}

/// Where the crawl starts
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Archive index pages listing the chapters
    #[serde(rename = "start-urls")]
    pub start_urls: Vec<String>,

    /// Identifier of the tab whose chapter list is harvested
    #[serde(rename = "tab-id")]
    pub tab_id: String,
}

/// CSS selectors describing the archive markup
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Container of one chapter tab; scoped by `id = tab-id`
    #[serde(rename = "tab-container", default = "default_tab_container")]
    pub tab_container: String,

    /// Chapter anchors inside the tab container
    #[serde(rename = "chapter-list", default = "default_chapter_list")]
    pub chapter_list: String,

    /// Element wrapping one rendered comic page
    #[serde(rename = "page-container", default = "default_page_container")]
    pub page_container: String,

    /// Chapter heading inside the page container
    #[serde(rename = "chapter-heading", default = "default_chapter_heading")]
    pub chapter_heading: String,

    /// Page image inside the page container
    #[serde(default = "default_image")]
    pub image: String,

    /// Attribute of the image element holding its URL
    #[serde(rename = "image-attr", default = "default_image_attr")]
    pub image_attr: String,

    /// Element carrying the next-page token
    #[serde(rename = "next-page", default = "default_next_page")]
    pub next_page: String,

    /// Attribute of the next-page element holding the token
    #[serde(rename = "next-page-attr", default = "default_next_page_attr")]
    pub next_page_attr: String,
}

impl SelectorConfig {
    /// Chapter-list selector scoped to the configured tab
    pub fn scoped_chapter_list(&self, tab_id: &str) -> String {
        format!(
            "{}[id=\"{}\"] {}",
            self.tab_container, tab_id, self.chapter_list
        )
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            tab_container: default_tab_container(),
            chapter_list: default_chapter_list(),
            page_container: default_page_container(),
            chapter_heading: default_chapter_heading(),
            image: default_image(),
            image_attr: default_image_attr(),
            next_page: default_next_page(),
            next_page_attr: default_next_page_attr(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root under which chapter directories are created
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Directory name used when a page carries no chapter heading
    #[serde(rename = "empty-label", default = "default_empty_label")]
    pub empty_label: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            empty_label: default_empty_label(),
        }
    }
}

fn default_max_pages_per_chapter() -> u32 {
    500
}

fn default_tab_container() -> String {
    ".tab-pane".to_string()
}

fn default_chapter_list() -> String {
    ".links-of-books.num_div>li>a[href]".to_string()
}

fn default_page_container() -> String {
    ".comic-detail".to_string()
}

fn default_chapter_heading() -> String {
    "h2.h4.text-center".to_string()
}

fn default_image() -> String {
    "#all .pjax-container img.img-fluid.show-pic".to_string()
}

fn default_image_attr() -> String {
    "src".to_string()
}

fn default_next_page() -> String {
    "#all a#right.next".to_string()
}

fn default_next_page_attr() -> String {
    "data-p".to_string()
}

fn default_output_directory() -> String {
    ".".to_string()
}

fn default_empty_label() -> String {
    "untitled".to_string()
}
