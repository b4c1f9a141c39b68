//! Comic-Ripple main entry point
//!
//! This is the command-line interface for the Comic-Ripple archive harvester.

use anyhow::Context;
use clap::Parser;
use comic_ripple::config::{load_config, Config};
use comic_ripple::crawler::run_crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Comic-Ripple: a polite comic archive harvester
///
/// Comic-Ripple walks the chapter list of a comic archive, follows each chapter's
/// pages, and saves every page image as `<output>/<chapter>/<page>.<ext>`.
#[derive(Parser, Debug)]
#[command(name = "comic-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A polite comic archive harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write chapter directories under this directory instead of the configured one
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;

    if let Some(output) = &cli.output {
        config.output.directory = output.display().to_string();
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let stats = run_crawl(config).await.context("Crawl failed")?;
    tracing::info!("Done: {}", stats);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("comic_ripple=info,warn"),
            1 => EnvFilter::new("comic_ripple=debug,info"),
            2 => EnvFilter::new("comic_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Comic-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Domain glob: {}", config.crawler.domain_glob);
    println!("  Parallelism: {}", config.crawler.parallelism);
    println!(
        "  Delay: {}ms + up to {}ms jitter",
        config.crawler.delay_ms, config.crawler.random_delay_ms
    );
    println!(
        "  Max pages per chapter: {}",
        config.crawler.max_pages_per_chapter
    );
    match config.crawler.max_concurrent_downloads {
        Some(limit) => println!("  Max concurrent downloads: {}", limit),
        None => println!("  Max concurrent downloads: unbounded"),
    }

    println!("\nArchive:");
    println!("  Tab: {}", config.archive.tab_id);
    println!(
        "  Chapter list: {}",
        config.selectors.scoped_chapter_list(&config.archive.tab_id)
    );
    for start_url in &config.archive.start_urls {
        println!("    * {}", start_url);
    }

    println!("\nPage Selectors:");
    println!("  Container: {}", config.selectors.page_container);
    println!("  Heading: {}", config.selectors.chapter_heading);
    println!(
        "  Image: {} [{}]",
        config.selectors.image, config.selectors.image_attr
    );
    println!(
        "  Next page: {} [{}]",
        config.selectors.next_page, config.selectors.next_page_attr
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Untitled chapters: {}", config.output.empty_label);

    println!("\n✓ Configuration is valid");
}
