//! Scrape artifact layout and loading.

use stancemap_common::artifacts::{
    html_path, latest_scrape_dir, load_country_contents, metadata_path, write_artifacts,
};
use stancemap_common::ScrapeMetadata;

fn metadata(code: &str, success: bool) -> ScrapeMetadata {
    ScrapeMetadata {
        country: format!("{code}-land"),
        code: code.to_string(),
        url: format!("https://www.{}.example", code.to_lowercase()),
        timestamp: "2025-06-28T10:00:00.000Z".to_string(),
        success,
        error: (!success).then(|| "navigation timeout".to_string()),
        content_length: 10,
        processing_time_ms: 1200,
    }
}

#[tokio::test]
async fn loads_successful_scrapes_with_metadata() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path(), "TL", "We condemn the invasion", Some("<p>x</p>"), &metadata("TL", true))
        .await
        .unwrap();
    write_artifacts(dir.path(), "FX", "Error: navigation timeout", None, &metadata("FX", false))
        .await
        .unwrap();

    assert!(html_path(dir.path(), "TL").exists());
    assert!(!html_path(dir.path(), "FX").exists());

    let json = std::fs::read_to_string(metadata_path(dir.path(), "TL")).unwrap();
    assert!(json.contains("\"contentLength\""));
    assert!(json.contains("\"processingTimeMs\""));
    assert!(!json.contains("\"error\""));

    let contents = load_country_contents(dir.path()).await.unwrap();
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].code, "TL");
    assert_eq!(contents[0].raw_text, "We condemn the invasion");
    assert_eq!(contents[0].source_url, "https://www.tl.example");
    assert_eq!(contents[0].timestamp, "2025-06-28T10:00:00.000Z");
}

#[tokio::test]
async fn text_without_metadata_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ZZ.txt"), "orphan text").unwrap();

    let contents = load_country_contents(dir.path()).await.unwrap();
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].source_url, "");
    assert!(!contents[0].timestamp.is_empty());
}

#[tokio::test]
async fn latest_scrape_dir_picks_newest_date() {
    let root = tempfile::tempdir().unwrap();
    for name in ["2025-06-01", "2025-06-28", "2025-05-30", "not-a-date"] {
        std::fs::create_dir(root.path().join(name)).unwrap();
    }
    std::fs::write(root.path().join("2025-07-01"), "a file, not a dir").unwrap();

    let latest = latest_scrape_dir(root.path()).await.unwrap().unwrap();
    assert!(latest.ends_with("2025-06-28"));

    let missing = latest_scrape_dir(&root.path().join("nope")).await.unwrap();
    assert!(missing.is_none());
}
