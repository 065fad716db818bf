use std::path::Path;
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use stancemap_common::{CombinedAnalysisResult, CountryTable};
use tracing::warn;

use crate::map::{build_map, CountryFill, MapView};
use crate::AppState;

// --- Helpers ---

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// File contents, `None` when it does not exist yet.
async fn read_optional(path: &Path) -> Result<Option<String>, Response> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read data file");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read data file",
            ))
        }
    }
}

async fn load_analysis(path: &Path) -> Option<CombinedAnalysisResult> {
    let text = read_optional(path).await.ok()??;
    match serde_json::from_str(&text) {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invalid analysis file");
            None
        }
    }
}

// --- Handlers ---

pub async fn countries_csv(State(state): State<Arc<AppState>>) -> Response {
    match read_optional(&state.paths.countries_csv).await {
        Ok(Some(csv)) => ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Country table not found"),
        Err(response) => response,
    }
}

pub async fn latest_analysis(State(state): State<Arc<AppState>>) -> Response {
    match read_optional(&state.paths.latest_analysis).await {
        Ok(Some(json)) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No analysis available"),
        Err(response) => response,
    }
}

#[derive(Serialize)]
pub struct MapResponse {
    pub view: String,
    pub countries: Vec<CountryFill>,
}

pub async fn api_map(
    State(state): State<Arc<AppState>>,
    UrlPath(view): UrlPath<String>,
) -> Response {
    let view = MapView::from_key(&view);

    let records = match read_optional(&state.paths.countries_csv).await {
        Ok(Some(text)) => match CountryTable::parse(&text) {
            Ok(table) => table.records(),
            Err(e) => {
                warn!(error = %e, "Invalid country table");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid country table");
            }
        },
        Ok(None) => Vec::new(),
        Err(response) => return response,
    };
    let analysis = load_analysis(&state.paths.latest_analysis).await;

    match build_map(&view, &records, analysis.as_ref()) {
        Some(countries) => Json(MapResponse {
            view: view.to_string(),
            countries,
        })
        .into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("Unknown view: {view}")),
    }
}
