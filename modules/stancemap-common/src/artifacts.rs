//! Per-country scrape artifacts: `<code>.txt`, `<code>.html`, `<code>.json`.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use crate::error::StanceMapError;
use crate::time::iso_timestamp;
use crate::types::{CountryContent, ScrapeMetadata};

pub fn text_path(dir: &Path, code: &str) -> PathBuf {
    dir.join(format!("{code}.txt"))
}

pub fn html_path(dir: &Path, code: &str) -> PathBuf {
    dir.join(format!("{code}.html"))
}

pub fn metadata_path(dir: &Path, code: &str) -> PathBuf {
    dir.join(format!("{code}.json"))
}

async fn write_file(path: PathBuf, contents: &[u8]) -> Result<(), StanceMapError> {
    tokio::fs::write(&path, contents)
        .await
        .map_err(|e| StanceMapError::io(path, e))
}

/// Persist one country's scrape. `html` is skipped when `None`.
pub async fn write_artifacts(
    dir: &Path,
    code: &str,
    text: &str,
    html: Option<&str>,
    metadata: &ScrapeMetadata,
) -> Result<(), StanceMapError> {
    write_file(text_path(dir, code), text.as_bytes()).await?;
    if let Some(html) = html {
        write_file(html_path(dir, code), html.as_bytes()).await?;
    }
    let path = metadata_path(dir, code);
    let json = serde_json::to_vec_pretty(metadata).map_err(|e| StanceMapError::json(&path, e))?;
    write_file(path, &json).await
}

pub async fn read_metadata(dir: &Path, code: &str) -> Result<ScrapeMetadata, StanceMapError> {
    let path = metadata_path(dir, code);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| StanceMapError::io(&path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StanceMapError::json(&path, e))
}

/// Most recent `YYYY-MM-DD` directory under `root`.
pub async fn latest_scrape_dir(root: &Path) -> Result<Option<PathBuf>, StanceMapError> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StanceMapError::io(root, e)),
    };

    let mut latest: Option<(NaiveDate, PathBuf)> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StanceMapError::io(root, e))?
    {
        let name = entry.file_name();
        let Some(date) = name
            .to_str()
            .and_then(|n| NaiveDate::parse_from_str(n, "%Y-%m-%d").ok())
        else {
            continue;
        };
        if !entry.path().is_dir() {
            continue;
        }
        if latest.as_ref().map_or(true, |(d, _)| date > *d) {
            latest = Some((date, entry.path()));
        }
    }
    Ok(latest.map(|(_, path)| path))
}

/// Load every scraped country text in `dir`, sorted by code.
///
/// Timestamp and URL come from the matching metadata file. Countries whose
/// metadata records a failed scrape are skipped; their text is an error
/// message, not page content. Missing or unreadable metadata falls back to
/// the current time and an empty URL.
pub async fn load_country_contents(dir: &Path) -> Result<Vec<CountryContent>, StanceMapError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| StanceMapError::io(dir, e))?;

    let mut contents = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StanceMapError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(code) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };

        let (timestamp, source_url) = match read_metadata(dir, &code).await {
            Ok(meta) if !meta.success => {
                debug!(code = code.as_str(), "Skipping failed scrape");
                continue;
            }
            Ok(meta) => (meta.timestamp, meta.url),
            Err(e) => {
                warn!(code = code.as_str(), error = %e, "Scrape metadata unavailable, using defaults");
                (iso_timestamp(Utc::now()), String::new())
            }
        };

        let raw_text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StanceMapError::io(&path, e))?;

        contents.push(CountryContent {
            code,
            raw_text,
            timestamp,
            source_url,
        });
    }

    contents.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(contents)
}
