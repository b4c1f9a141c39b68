//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small comic archive and run the full
//! crawl cycle end-to-end into a temporary output directory.

use comic_ripple::config::{
    load_config, ArchiveConfig, Config, CrawlerConfig, OutputConfig, SelectorConfig,
};
use comic_ripple::crawler::Coordinator;
use std::io::Write;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `start_url` into `output_dir`
fn create_test_config(start_url: String, output_dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            domain_glob: "127.0.0.1".to_string(),
            parallelism: 2,
            delay_ms: 5, // Very short for testing
            random_delay_ms: 5,
            max_pages_per_chapter: 50,
            max_concurrent_downloads: None,
            user_agent: Some("TestBot/1.0".to_string()),
        },
        archive: ArchiveConfig {
            start_urls: vec![start_url],
            tab_id: "1330".to_string(),
        },
        selectors: SelectorConfig::default(),
        output: OutputConfig {
            directory: output_dir.display().to_string(),
            empty_label: "untitled".to_string(),
        },
    }
}

fn archive_page(tabs: &[(&str, Vec<&str>)]) -> String {
    let mut html = String::from("<html><body>");
    for (tab_id, links) in tabs {
        html.push_str(&format!(
            r#"<div class="tab-pane" id="{}"><ol class="links-of-books num_div">"#,
            tab_id
        ));
        for (i, link) in links.iter().enumerate() {
            html.push_str(&format!(r#"<li><a href="{}">{}</a></li>"#, link, i + 1));
        }
        html.push_str("</ol></div>");
    }
    html.push_str("</body></html>");
    html
}

fn comic_page(heading: &str, img: &str, next: &str) -> String {
    format!(
        r#"<html><body><div class="comic-detail">
            <h2 class="h4 text-center">{}</h2>
            <div id="all">
                <div class="pjax-container"><img class="img-fluid show-pic" src="{}"></div>
                <a id="right" class="next" data-p="{}">next</a>
            </div>
        </div></body></html>"#,
        heading, img, next
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, route: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_follows_chapter_chains() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/manhua/147",
        archive_page(&[
            ("1328", vec!["/manhua/139/1328_1.html"]),
            (
                "1330",
                vec!["/manhua/147/1330_1.html", "/manhua/147/1330_2.html"],
            ),
        ]),
    )
    .await;

    // Chapter 1: two pages
    mount_page(
        &mock_server,
        "/manhua/147/1330_1.html",
        comic_page("Vol 1", "/img/1/001.png", "2"),
    )
    .await;
    mount_page(
        &mock_server,
        "/manhua/147/1330_1_p2.html",
        comic_page("Vol 1", &format!("{}/img/1/002.png", base_url), ""),
    )
    .await;

    // Chapter 2: a single page whose image URL has no extension
    mount_page(
        &mock_server,
        "/manhua/147/1330_2.html",
        comic_page("Vol 2", "/img/2/cover", "0"),
    )
    .await;

    mount_image(&mock_server, "/img/1/001.png", b"chapter-1-page-1").await;
    mount_image(&mock_server, "/img/1/002.png", b"chapter-1-page-2").await;
    mount_image(&mock_server, "/img/2/cover", b"chapter-2-page-1").await;

    // Never requested: other tab and past the end of chapter 1
    for route in ["/manhua/139/1328_1.html", "/manhua/147/1330_1_p3.html"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;
    }

    let output = tempfile::tempdir().expect("Failed to create output dir");
    let config = create_test_config(format!("{}/manhua/147", base_url), output.path());

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.pages_visited, 4);
    assert_eq!(stats.pages_failed, 0);
    assert_eq!(stats.chapters_queued, 2);
    assert_eq!(stats.images_found, 3);
    assert_eq!(stats.images_saved, 3);
    assert!(stats.downloads_settled());

    let read = |rel: &str| std::fs::read(output.path().join(rel)).expect(rel);
    assert_eq!(read("Vol 1/1.png"), b"chapter-1-page-1");
    assert_eq!(read("Vol 1/2.png"), b"chapter-1-page-2");
    assert_eq!(read("Vol 2/1.jpg"), b"chapter-2-page-1");
}

#[tokio::test]
async fn test_failed_download_does_not_hang() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/manhua/147",
        archive_page(&[("1330", vec!["/manhua/147/1330_1.html"])]),
    )
    .await;
    mount_page(
        &mock_server,
        "/manhua/147/1330_1.html",
        comic_page("Vol 1", "/img/missing.png", "2"),
    )
    .await;
    mount_page(
        &mock_server,
        "/manhua/147/1330_1_p2.html",
        comic_page("Vol 1", "/img/present.png", ""),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/img/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_image(&mock_server, "/img/present.png", b"page-2").await;

    let output = tempfile::tempdir().expect("Failed to create output dir");
    let mut config = create_test_config(format!("{}/manhua/147", base_url), output.path());
    config.crawler.max_concurrent_downloads = Some(1);

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let stats = tokio::time::timeout(std::time::Duration::from_secs(30), coordinator.run())
        .await
        .expect("Crawl hung")
        .expect("Crawl failed");

    assert_eq!(stats.images_found, 2);
    assert_eq!(stats.images_saved, 1);
    assert_eq!(stats.downloads_failed, 1);
    assert!(!output.path().join("Vol 1/1.png").exists());
    assert_eq!(
        std::fs::read(output.path().join("Vol 1/2.png")).unwrap(),
        b"page-2"
    );
}

#[tokio::test]
async fn test_pages_without_image_end_the_chain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/manhua/147",
        archive_page(&[("1330", vec!["/manhua/147/1330_1.html"])]),
    )
    .await;
    // Placeholder page: no image, even though it advertises a next page
    mount_page(
        &mock_server,
        "/manhua/147/1330_1.html",
        comic_page("", "", "2"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/manhua/147/1330_1_p2.html"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let output = tempfile::tempdir().expect("Failed to create output dir");
    let config = create_test_config(format!("{}/manhua/147", base_url), output.path());

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.images_found, 0);
}

#[tokio::test]
async fn test_missing_chapter_page_is_logged_not_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/manhua/147",
        archive_page(&[(
            "1330",
            vec!["/manhua/147/1330_404.html", "/manhua/147/1330_2.html"],
        )]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/manhua/147/1330_404.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/manhua/147/1330_2.html",
        comic_page("", "/img/2.webp", ""),
    )
    .await;
    mount_image(&mock_server, "/img/2.webp", b"webp").await;

    let output = tempfile::tempdir().expect("Failed to create output dir");
    let config = create_test_config(format!("{}/manhua/147", base_url), output.path());

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.pages_failed, 1);
    assert_eq!(stats.images_saved, 1);
    // Blank heading falls back to the configured label
    assert_eq!(
        std::fs::read(output.path().join("untitled/1.webp")).unwrap(),
        b"webp"
    );
}

#[tokio::test]
async fn test_config_file_drives_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/list",
        archive_page(&[("7", vec!["/c/7_1.html"])]),
    )
    .await;
    mount_page(&mock_server, "/c/7_1.html", comic_page("Ch 7", "/p/1.gif", "")).await;
    mount_image(&mock_server, "/p/1.gif", b"gif").await;

    let output = tempfile::tempdir().expect("Failed to create output dir");
    let mut config_file = tempfile::NamedTempFile::new().expect("Failed to create config");
    write!(
        config_file,
        r#"
[crawler]
domain-glob = "*"
parallelism = 1

[archive]
start-urls = ["{}/list"]
tab-id = "7"

[output]
directory = "{}"
"#,
        base_url,
        output.path().display()
    )
    .unwrap();
    config_file.flush().unwrap();

    let config = load_config(config_file.path()).expect("Failed to load config");
    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.images_saved, 1);
    assert_eq!(
        std::fs::read(output.path().join("Ch 7/1.gif")).unwrap(),
        b"gif"
    );
}

#[tokio::test]
async fn test_unusable_image_counts_as_failed_download() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/manhua/147",
        archive_page(&[("1330", vec!["/manhua/147/1330_1.html"])]),
    )
    .await;
    mount_page(
        &mock_server,
        "/manhua/147/1330_1.html",
        comic_page("Vol 1", "javascript:void(0)", "2"),
    )
    .await;
    mount_page(
        &mock_server,
        "/manhua/147/1330_1_p2.html",
        comic_page("Vol 1", "/img/2.png", ""),
    )
    .await;
    mount_image(&mock_server, "/img/2.png", b"page-2").await;

    let output = tempfile::tempdir().expect("Failed to create output dir");
    let config = create_test_config(format!("{}/manhua/147", base_url), output.path());

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let stats = coordinator.run().await.expect("Crawl failed");

    assert_eq!(stats.images_found, 2);
    assert_eq!(stats.images_saved, 1);
    assert_eq!(stats.downloads_failed, 1);
    assert!(stats.downloads_settled());
    assert!(output.path().join("Vol 1/2.png").exists());
}
