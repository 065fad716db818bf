//! Browserless /content client against an in-process stand-in.

use axum::{extract::Query, http::StatusCode, routing::post, Json, Router};
use browserless_client::{BrowserlessClient, BrowserlessError, ContentRequest};
use serde_json::Value;
use std::collections::HashMap;

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn content_returns_rendered_html_and_passes_token() {
    let app = Router::new().route(
        "/content",
        post(
            |Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                assert_eq!(q.get("token").map(String::as_str), Some("secret"));
                format!("<html><body>{}</body></html>", body["url"].as_str().unwrap())
            },
        ),
    );
    let base = spawn(app).await;

    let client = BrowserlessClient::new(&base, Some("secret")).unwrap();
    let html = client
        .content(&ContentRequest::new("https://www.example.com"))
        .await
        .unwrap();

    assert_eq!(html, "<html><body>https://www.example.com</body></html>");
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let app = Router::new().route(
        "/content",
        post(|| async { (StatusCode::BAD_REQUEST, "navigation failed") }),
    );
    let base = spawn(app).await;

    let client = BrowserlessClient::new(&base, None).unwrap();
    let err = client
        .content(&ContentRequest::new("https://www.example.com"))
        .await
        .unwrap_err();

    match err {
        BrowserlessError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "navigation failed");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}
