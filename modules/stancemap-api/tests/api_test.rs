//! Router tests: data files and map views served from a scratch directory.
//!
//! Run with: cargo test -p stancemap-api --test api_test

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use stancemap_api::{app, AppState};
use stancemap_common::Paths;
use tower::ServiceExt;

const CSV: &str = "country,code,foreign_affairs_ministry_url,http_response_code,robots_txt\n\
                   Testland,TL,https://www.example.com,200,404\n\
                   Slowland,SL,slow.example,TIMEOUT,\n";

const ANALYSIS: &str = r#"{
  "countryPositions": [
    { "topic": "Ukraine Conflict",
      "countries": [
        { "TL": { "exact_quote": "We condemn the invasion",
                  "summarised_stance_in_english": "Condemns the invasion",
                  "relevance_to_topic": 0.9, "clarity_of_stance": 0.85,
                  "verification": "exact_match", "verified": true,
                  "source_timestamp": "2025-06-28T10:00:00.000Z",
                  "source_url": "https://www.example.com" } },
        { "SL": { "exact_quote": "Peace", "summarised_stance_in_english": "Vague",
                  "relevance_to_topic": 0.9, "clarity_of_stance": 0.3 } }
      ] }
  ],
  "dataContext": "ctx",
  "analysisTimestamp": "2025-06-28T12:00:00.000Z",
  "topicAnalysisFiles": ["topic_ukraine_conflict_2025-06-28T12-00-00-000Z.json"]
}"#;

fn router(dir: &tempfile::TempDir, with_files: bool) -> Router {
    let paths = Paths {
        results_root: dir.path().join("results"),
        countries_csv: dir.path().join("national_governments.csv"),
        latest_analysis: dir.path().join("latest-analysis.json"),
    };
    if with_files {
        std::fs::write(&paths.countries_csv, CSV).unwrap();
        std::fs::write(&paths.latest_analysis, ANALYSIS).unwrap();
    }
    app(Arc::new(AppState { paths }))
}

async fn get(router: Router, uri: &str) -> (StatusCode, String, Option<String>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let cache = response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap(), cache)
}

// ---------------------------------------------------------------------------
// Data files
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_and_files_are_served() {
    let dir = tempfile::tempdir().unwrap();

    let (status, body, cache) = get(router(&dir, true), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert_eq!(cache.as_deref(), Some("no-store"));

    let (status, body, _) = get(router(&dir, true), "/national_governments.csv").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("country,code"));

    let (status, body, _) = get(router(&dir, true), "/latest-analysis.json").await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["dataContext"], "ctx");
}

#[tokio::test]
async fn missing_files_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _, _) = get(router(&dir, false), "/latest-analysis.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _, _) = get(router(&dir, false), "/national_governments.csv").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Map views
// ---------------------------------------------------------------------------

#[tokio::test]
async fn website_view_classifies_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body, _) = get(router(&dir, true), "/api/map/website").await;
    assert_eq!(status, StatusCode::OK);

    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["view"], "website");
    let countries = value["countries"].as_array().unwrap();
    assert_eq!(countries[0]["class"], "available");
    assert_eq!(countries[0]["fill"], "#424242");
    assert_eq!(countries[1]["class"], "timeout");
    assert_eq!(countries[1]["tooltip"], "Slowland - Website Timeout - Click to try");
    assert_eq!(countries[1]["link"], "https://slow.example");
}

#[tokio::test]
async fn topic_alias_highlights_clear_positions_only() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body, _) = get(router(&dir, true), "/api/map/ukraine").await;
    assert_eq!(status, StatusCode::OK);

    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    let countries = value["countries"].as_array().unwrap();
    assert_eq!(countries[0]["code"], "TL");
    assert_eq!(countries[0]["class"], "high_quality");
    assert_eq!(countries[0]["fill"], "#1B5E20");
    assert_eq!(countries[1]["class"], "no_data");
    assert!(countries[1].get("link").is_none());
}

#[tokio::test]
async fn unknown_topic_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body, _) = get(router(&dir, true), "/api/map/tariffs").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Unknown view"));
}
