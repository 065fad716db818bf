//! Integration tests for the page aggregator against a mock renderer.
//!
//! Run with: cargo test -p stancemap-scout --test aggregator_test

use std::sync::Arc;
use std::time::Duration;

use stancemap_common::artifacts::{load_country_contents, read_metadata};
use stancemap_common::{AggregatorConfig, CountryRecord, Schedule};
use stancemap_scout::testing::{live_country, ministry_page, MockRenderer};
use stancemap_scout::Aggregator;

fn fast_config() -> AggregatorConfig {
    AggregatorConfig {
        concurrency: 2,
        request_delay: Duration::ZERO,
        ..AggregatorConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_country_does_not_block_others() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = MockRenderer::new()
        .on_page("https://www.one.example", &ministry_page("We condemn the invasion"))
        .failing("https://www.two.example", "navigation timeout of 30000 ms exceeded")
        .on_page("https://www.three.example", &ministry_page("Climate finance matters"));

    let records = vec![
        live_country("Oneland", "ON", "https://www.one.example"),
        live_country("Twoland", "TW", "https://www.two.example"),
        live_country("Threeland", "TH", "https://www.three.example"),
    ];

    let aggregator = Aggregator::new(Arc::new(renderer), fast_config());
    let report = aggregator.run(&records, dir.path()).await.unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(
        report.outcomes.iter().map(|o| o.code.as_str()).collect::<Vec<_>>(),
        vec!["ON", "TW", "TH"]
    );

    let failed = read_metadata(dir.path(), "TW").await.unwrap();
    assert!(!failed.success);
    assert!(failed.error.unwrap().contains("navigation timeout"));
    let failed_text = std::fs::read_to_string(dir.path().join("TW.txt")).unwrap();
    assert!(failed_text.starts_with("Error: "));
    assert!(!dir.path().join("TW.html").exists());

    let ok = read_metadata(dir.path(), "ON").await.unwrap();
    assert!(ok.success);
    assert_eq!(ok.url, "https://www.one.example");
    assert!(dir.path().join("ON.html").exists());

    // Failed scrapes never reach the analyzer.
    let contents = load_country_contents(dir.path()).await.unwrap();
    let codes: Vec<_> = contents.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["ON", "TH"]);
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_live_http_rows_are_scraped_and_duplicates_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        MockRenderer::new()
            .on_page("https://www.first.example", &ministry_page("first"))
            .on_page("https://www.second.example", &ministry_page("second")),
    );

    let mut blocked = live_country("Blockedland", "BL", "https://www.blocked.example");
    blocked.http_status = "403".into();
    let no_scheme = live_country("Bareland", "BA", "bare.example");

    let records: Vec<CountryRecord> = vec![
        live_country("Firstland", "DU", "https://www.first.example"),
        blocked,
        no_scheme,
        live_country("Secondland", "DU", "https://www.second.example"),
    ];

    let aggregator = Aggregator::new(renderer.clone(), fast_config());
    let report = aggregator.run(&records, dir.path()).await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(renderer.calls(), vec!["https://www.first.example".to_string()]);
    let text = std::fs::read_to_string(dir.path().join("DU.txt")).unwrap();
    assert_eq!(text, "first");
}

#[tokio::test]
async fn html_artifact_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = MockRenderer::new().on_page("https://www.x.example", &ministry_page("x"));
    let config = AggregatorConfig {
        save_html: false,
        schedule: Schedule::Batched,
        ..fast_config()
    };

    let aggregator = Aggregator::new(Arc::new(renderer), config);
    let report = aggregator
        .run(&[live_country("Xland", "XL", "https://www.x.example")], dir.path())
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert!(dir.path().join("XL.txt").exists());
    assert!(dir.path().join("XL.json").exists());
    assert!(!dir.path().join("XL.html").exists());
}

#[tokio::test]
async fn scrape_dir_is_created() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("2025-06-28");
    let renderer = MockRenderer::new().on_page("https://www.x.example", &ministry_page("x"));

    let aggregator = Aggregator::new(Arc::new(renderer), fast_config());
    let report = aggregator
        .run(&[live_country("Xland", "XL", "https://www.x.example")], &dir)
        .await
        .unwrap();

    assert_eq!(report.scrape_dir, dir);
    assert!(dir.join("XL.txt").exists());
}
