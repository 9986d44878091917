//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small fake archive and run the full
//! listing → article → output cycle end-to-end.

use archive_harvest::config::{Config, CrawlerConfig, OutputConfig, SourceConfig, UserAgentConfig};
use archive_harvest::crawler::{harvest, Harvester};
use archive_harvest::model::{ArticleFailure, DateRange};
use archive_harvest::output::article_path;
use archive_harvest::{ArticleContent, FetchError};
use chrono::NaiveDate;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            first_page: 1,
            max_pages_per_day: 10,
            concurrency: 3,
            politeness_delay_ms: 0, // No throttling in tests
            request_timeout_secs: 5,
            max_retries: 1,
            retry_delay_ms: 1,
        },
        source: SourceConfig {
            base_url: base_url.to_string(),
            ..SourceConfig::default()
        },
        user_agent: UserAgentConfig {
            value: "TestBot/1.0".to_string(),
        },
        output: OutputConfig {
            metadata_file: "metadata.csv".to_string(),
        },
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

/// Listing markup with one entry per (time, path, title)
fn listing_html(entries: &[(&str, &str, &str)]) -> String {
    let items: String = entries
        .iter()
        .map(|(time, href, title)| {
            format!(
                r#"<li><span class="itemTime">{}</span> <a class="itemTitle" href="{}">{}</a></li>"#,
                time, href, title
            )
        })
        .collect();

    format!(
        r#"<html><head><title>Archiwum</title></head><body>
        <div class="dayInArchive"><ul>{}</ul></div>
        </body></html>"#,
        items
    )
}

fn article_html(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>", p)).collect();
    format!(
        r#"<html><body><div id="detail">{}</div></body></html>"#,
        body
    )
}

async fn mount_listing(
    server: &MockServer,
    day: &str,
    page: u32,
    entries: &[(&str, &str, &str)],
) {
    Mock::given(method("GET"))
        .and(path(format!("/archiwum/{}", day)))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(entries)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_article(server: &MockServer, article_path: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(article_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_day_harvest_in_order() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_listing(
        &server,
        "2023-01-01",
        1,
        &[
            ("08:15", "/kraj/a1", "First"),
            ("09:30", "/kraj/a2", "Second"),
            ("23:59", "/swiat/a3", "Third"),
        ],
    )
    .await;
    mount_listing(&server, "2023-01-01", 2, &[]).await;
    mount_listing(
        &server,
        "2023-01-02",
        1,
        &[("07:00", "/kraj/b1", "Fourth"), ("12:00", "/kraj/b2", "Fifth")],
    )
    .await;
    mount_listing(&server, "2023-01-02", 2, &[]).await;

    for (p, text) in [
        ("/kraj/a1", "one"),
        ("/kraj/a2", "two"),
        ("/swiat/a3", "three"),
        ("/kraj/b1", "four"),
        ("/kraj/b2", "five"),
    ] {
        mount_article(&server, p, article_html(&[text])).await;
    }

    let config = create_test_config(&base_url);
    let harvester = Harvester::new(config, CancellationToken::new()).expect("harvester");
    let mut sink: Vec<ArticleContent> = Vec::new();
    let summary = harvester
        .run(DateRange::new(date("2023-01-01"), date("2023-01-02")), &mut sink)
        .await
        .expect("harvest failed");

    let urls: Vec<_> = sink.iter().map(|a| a.record.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/kraj/a1", base_url),
            format!("{}/kraj/a2", base_url),
            format!("{}/swiat/a3", base_url),
            format!("{}/kraj/b1", base_url),
            format!("{}/kraj/b2", base_url),
        ]
    );

    let bodies: Vec<_> = sink.iter().map(|a| a.body.as_str()).collect();
    assert_eq!(bodies, vec!["one", "two", "three", "four", "five"]);

    assert_eq!(
        sink[0].record.published_at,
        date("2023-01-01").and_hms_opt(8, 15, 0)
    );
    assert_eq!(sink[3].record.archive_date, date("2023-01-02"));
    assert_eq!(sink[4].record.title, "Fifth");

    assert_eq!(summary.dates_crawled, 2);
    assert_eq!(summary.listing_pages, 4);
    assert_eq!(summary.records_discovered, 5);
    assert_eq!(summary.articles_fetched, 5);
    assert_eq!(summary.articles_extracted, 5);
    assert_eq!(summary.total_failures(), 0);
    assert!(!summary.cancelled);
}

#[tokio::test]
async fn test_reversed_range_is_empty_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let config = create_test_config(&server.uri());
    let summary = harvest(
        config,
        DateRange::new(date("2023-01-05"), date("2023-01-01")),
        dir.path(),
        CancellationToken::new(),
    )
    .await
    .expect("empty run should succeed");

    assert_eq!(summary.dates_crawled, 0);
    assert_eq!(summary.records_discovered, 0);

    // header only
    let csv = std::fs::read_to_string(dir.path().join("metadata.csv")).expect("csv");
    assert_eq!(csv.trim(), "published_at,url,title");
}

#[tokio::test]
async fn test_fallback_and_failures_keep_records() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_listing(
        &server,
        "2023-02-01",
        1,
        &[
            ("10:00", "/fallback", "Old template"),
            ("11:00", "/missing", "Removed"),
            ("", "/nothing", "No time, no content"),
        ],
    )
    .await;
    mount_listing(&server, "2023-02-01", 2, &[]).await;

    mount_article(
        &server,
        "/fallback",
        r#"<html><body><article><p>Legacy body</p></article></body></html>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_article(
        &server,
        "/nothing",
        "<html><body><nav>menu</nav></body></html>".to_string(),
    )
    .await;

    let config = create_test_config(&base_url);
    let harvester = Harvester::new(config, CancellationToken::new()).expect("harvester");
    let mut sink: Vec<ArticleContent> = Vec::new();
    let summary = harvester
        .run(DateRange::new(date("2023-02-01"), date("2023-02-01")), &mut sink)
        .await
        .expect("harvest failed");

    assert_eq!(sink.len(), 3);
    assert_eq!(sink[0].body, "Legacy body");
    assert!(sink[0].failure.is_none());

    assert!(sink[1].body.is_empty());
    assert!(matches!(
        sink[1].failure,
        Some(ArticleFailure::Fetch(FetchError::NotFound { status: 404, .. }))
    ));

    assert!(sink[2].body.is_empty());
    assert!(sink[2].record.published_at.is_none());
    assert!(matches!(sink[2].failure, Some(ArticleFailure::ExtractionFailed)));

    assert_eq!(summary.untimed_records, 1);
    assert_eq!(summary.not_found_failures, 1);
    assert_eq!(summary.extraction_failures, 1);
    assert_eq!(summary.articles_extracted, 1);
}

#[tokio::test]
async fn test_transient_listing_failure_skips_only_that_day() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    // max_retries = 1: two attempts for the broken day
    Mock::given(method("GET"))
        .and(path("/archiwum/2023-03-01"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    mount_listing(&server, "2023-03-02", 1, &[("06:00", "/ok", "Survivor")]).await;
    mount_listing(&server, "2023-03-02", 2, &[]).await;
    mount_article(&server, "/ok", article_html(&["still here"])).await;

    let config = create_test_config(&base_url);
    let harvester = Harvester::new(config, CancellationToken::new()).expect("harvester");
    let mut sink: Vec<ArticleContent> = Vec::new();
    let summary = harvester
        .run(DateRange::new(date("2023-03-01"), date("2023-03-02")), &mut sink)
        .await
        .expect("harvest failed");

    assert_eq!(sink.len(), 1);
    assert_eq!(sink[0].body, "still here");
    assert_eq!(summary.listing_failures, 1);
    assert_eq!(summary.dates_crawled, 2);
    assert_eq!(summary.retries, 1);
}

#[tokio::test]
async fn test_duplicates_across_days_are_dropped() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_listing(&server, "2023-04-01", 1, &[("22:00", "/late-story", "Late")]).await;
    mount_listing(&server, "2023-04-01", 2, &[]).await;
    // the same article listed again the next day
    mount_listing(
        &server,
        "2023-04-02",
        1,
        &[("00:10", "/late-story", "Late"), ("08:00", "/new", "New")],
    )
    .await;
    mount_listing(&server, "2023-04-02", 2, &[]).await;
    mount_article(&server, "/late-story", article_html(&["late"])).await;
    mount_article(&server, "/new", article_html(&["new"])).await;

    let config = create_test_config(&base_url);
    let harvester = Harvester::new(config, CancellationToken::new()).expect("harvester");
    let mut sink: Vec<ArticleContent> = Vec::new();
    let summary = harvester
        .run(DateRange::new(date("2023-04-01"), date("2023-04-02")), &mut sink)
        .await
        .expect("harvest failed");

    assert_eq!(sink.len(), 2);
    assert_eq!(sink[0].record.archive_date, date("2023-04-01"));
    assert_eq!(summary.duplicates_dropped, 1);
}

#[tokio::test]
async fn test_harvest_writes_files() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_listing(
        &server,
        "2023-05-10",
        1,
        &[
            ("14:05", "/kraj/storm,abc", "Storm, again"),
            ("15:00", "/kraj/gone", "Gone"),
        ],
    )
    .await;
    mount_listing(&server, "2023-05-10", 2, &[]).await;
    mount_article(
        &server,
        "/kraj/storm,abc",
        article_html(&["First  paragraph.", "", "Second paragraph."]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/kraj/gone"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("out");
    let config = create_test_config(&base_url);
    let summary = harvest(
        config,
        DateRange::new(date("2023-05-10"), date("2023-05-10")),
        &out,
        CancellationToken::new(),
    )
    .await
    .expect("harvest failed");

    assert_eq!(summary.records_discovered, 2);

    let csv = std::fs::read_to_string(out.join("metadata.csv")).expect("csv");
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "published_at,url,title");
    assert_eq!(
        lines[1],
        format!(
            "2023-05-10 14:05:00,\"{}/kraj/storm,abc\",\"Storm, again\"",
            base_url
        )
    );
    assert_eq!(lines[2], format!("2023-05-10 15:00:00,{}/kraj/gone,Gone", base_url));

    let stored = archive_harvest::MetadataRecord {
        archive_date: date("2023-05-10"),
        published_at: date("2023-05-10").and_hms_opt(14, 5, 0),
        url: format!("{}/kraj/storm,abc", base_url),
        title: "Storm, again".to_string(),
    };
    let body = std::fs::read_to_string(out.join(article_path(&stored))).expect("body file");
    assert_eq!(body, "First paragraph.\nSecond paragraph.");

    // no body file for the failed article
    let day_dir: Vec<_> = std::fs::read_dir(out.join("2023-05-10"))
        .expect("day dir")
        .collect();
    assert_eq!(day_dir.len(), 1);
}

#[tokio::test]
async fn test_cancelled_before_start_fetches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = create_test_config(&server.uri());
    let harvester = Harvester::new(config, cancel).expect("harvester");
    let mut sink: Vec<ArticleContent> = Vec::new();
    let summary = harvester
        .run(DateRange::new(date("2023-01-01"), date("2023-01-31")), &mut sink)
        .await
        .expect("cancelled run still succeeds");

    assert!(sink.is_empty());
    assert!(summary.cancelled);
    assert_eq!(summary.listing_pages, 0);
}
