use crate::config::types::{ArchiveConfig, Config, CrawlerConfig, OutputConfig, SelectorConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_archive_config(&config.archive)?;
    validate_selectors(&config.selectors, &config.archive.tab_id)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.domain_glob.trim().is_empty() {
        return Err(ConfigError::Validation(
            "domain_glob cannot be empty".to_string(),
        ));
    }

    if config.parallelism < 1 || config.parallelism > 100 {
        return Err(ConfigError::Validation(format!(
            "parallelism must be between 1 and 100, got {}",
            config.parallelism
        )));
    }

    if config.max_pages_per_chapter < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_per_chapter must be >= 1, got {}",
            config.max_pages_per_chapter
        )));
    }

    if config.max_concurrent_downloads == Some(0) {
        return Err(ConfigError::Validation(
            "max_concurrent_downloads must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the archive entry points
fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    if config.start_urls.is_empty() {
        return Err(ConfigError::Validation(
            "start_urls must contain at least one URL".to_string(),
        ));
    }

    for start in &config.start_urls {
        let url = Url::parse(start).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Start URL '{}' must use http or https",
                start
            )));
        }
    }

    let tab_id = config.tab_id.trim();
    if tab_id.is_empty() {
        return Err(ConfigError::Validation("tab_id cannot be empty".to_string()));
    }

    // Matched exactly against the tab's id attribute
    if tab_id != config.tab_id {
        return Err(ConfigError::Validation(format!(
            "tab_id must not have surrounding whitespace, got '{}'",
            config.tab_id
        )));
    }

    // Interpolated into an attribute selector
    if tab_id.contains('"') || tab_id.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "tab_id must not contain quotes or backslashes, got '{}'",
            config.tab_id
        )));
    }

    Ok(())
}

/// Validates that every selector compiles
fn validate_selectors(config: &SelectorConfig, tab_id: &str) -> Result<(), ConfigError> {
    let scoped = config.scoped_chapter_list(tab_id);
    let selectors = [
        ("chapter-list", scoped.as_str()),
        ("page-container", config.page_container.as_str()),
        ("chapter-heading", config.chapter_heading.as_str()),
        ("image", config.image.as_str()),
        ("next-page", config.next_page.as_str()),
    ];

    for (name, selector) in selectors {
        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, selector, e))
        })?;
    }

    if config.image_attr.is_empty() || config.next_page_attr.is_empty() {
        return Err(ConfigError::Validation(
            "image_attr and next_page_attr cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    let label = config.empty_label.trim();
    if label.is_empty() || label == "." || label == ".." {
        return Err(ConfigError::Validation(format!(
            "empty_label must name a directory, got '{}'",
            config.empty_label
        )));
    }

    if label.contains('/') || label.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "empty_label must not contain path separators, got '{}'",
            config.empty_label
        )));
    }

    Ok(())
}
