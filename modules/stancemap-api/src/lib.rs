pub mod map;
pub mod rest;

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use stancemap_common::Paths;
use tower_http::set_header::SetResponseHeaderLayer;

pub struct AppState {
    pub paths: Paths,
}

/// The dashboard API. Files are read from disk on every request, so a fresh
/// probe or analysis run is served without a restart.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Data files the dashboard loads
        .route("/national_governments.csv", get(rest::countries_csv))
        .route("/latest-analysis.json", get(rest::latest_analysis))
        // Map classification
        .route("/api/map/{view}", get(rest::api_map))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path + status + latency
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
