//! Result files in the results root: one `topic_<slug>_<timestamp>.json` per
//! topic, and the combined document built from them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use stancemap_common::time::{file_timestamp, iso_timestamp};
use stancemap_common::{
    CombinedAnalysisResult, StanceMapError, TopicAnalysisResult, TopicPositions,
};
use tracing::{info, warn};

const TOPIC_PREFIX: &str = "topic_";
const COMBINED_PREFIX: &str = "combined_analysis_";

pub fn topic_file_name(slug: &str, at: DateTime<Utc>) -> String {
    format!("{TOPIC_PREFIX}{slug}_{}.json", file_timestamp(at))
}

/// Slug part of a topic file name: everything between `topic_` and the last
/// `_<timestamp>`.
pub fn slug_from_file_name(name: &str) -> Option<&str> {
    let stem = name.strip_prefix(TOPIC_PREFIX)?.strip_suffix(".json")?;
    let (slug, _timestamp) = stem.rsplit_once('_')?;
    Some(slug)
}

/// Every `topic_*.json` directly under `root`, sorted by name. A missing root
/// holds no files.
pub async fn existing_topic_files(root: &Path) -> Result<Vec<PathBuf>, StanceMapError> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StanceMapError::io(root, e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StanceMapError::io(root, e))?
    {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(TOPIC_PREFIX) && name.ends_with(".json") {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// The newest existing file whose slug is exactly `slug`.
pub fn find_cached(existing: &[PathBuf], slug: &str) -> Option<PathBuf> {
    existing
        .iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(slug_from_file_name)
                == Some(slug)
        })
        .max()
        .cloned()
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StanceMapError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StanceMapError::io(parent, e))?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(|e| StanceMapError::json(path, e))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| StanceMapError::io(path, e))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StanceMapError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| StanceMapError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StanceMapError::json(path, e))
}

pub async fn read_topic(path: &Path) -> Result<TopicAnalysisResult, StanceMapError> {
    read_json(path).await
}

/// Overwrite an existing topic file.
pub async fn rewrite_topic(path: &Path, result: &TopicAnalysisResult) -> Result<(), StanceMapError> {
    write_json(path, result).await
}

/// Write a new topic file under `root`; returns its path.
pub async fn write_topic(
    root: &Path,
    result: &TopicAnalysisResult,
    at: DateTime<Utc>,
) -> Result<PathBuf, StanceMapError> {
    let slug = stancemap_common::topic_slug(&result.topic);
    let path = root.join(topic_file_name(&slug, at));
    write_json(&path, result).await?;
    info!(path = %path.display(), "Topic analysis saved");
    Ok(path)
}

/// Fold topic files into one document, in the order given. Files that cannot
/// be read are logged and left out of `countryPositions`.
pub async fn combine(
    topic_files: &[PathBuf],
    topic_count: usize,
    at: DateTime<Utc>,
) -> CombinedAnalysisResult {
    let mut country_positions = Vec::with_capacity(topic_files.len());
    for path in topic_files {
        match read_topic(path).await {
            Ok(topic) => country_positions.push(TopicPositions {
                topic: topic.topic,
                countries: topic.countries,
            }),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read topic file"),
        }
    }

    CombinedAnalysisResult {
        country_positions,
        data_context: format!(
            "Comprehensive analysis across {topic_count} topics with incremental updates support. Each topic analyzed separately and combined."
        ),
        analysis_timestamp: iso_timestamp(at),
        topic_analysis_files: topic_files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect(),
    }
}

/// Write `combined_analysis_<timestamp>.json` under `root` and the same
/// document to `latest`. Returns the timestamped path.
pub async fn write_combined(
    root: &Path,
    latest: &Path,
    combined: &CombinedAnalysisResult,
    at: DateTime<Utc>,
) -> Result<PathBuf, StanceMapError> {
    let path = root.join(format!("{COMBINED_PREFIX}{}.json", file_timestamp(at)));
    write_json(&path, combined).await?;
    write_json(latest, combined).await?;
    info!(path = %path.display(), latest = %latest.display(), "Combined analysis saved");
    Ok(path)
}

pub async fn read_combined(path: &Path) -> Result<CombinedAnalysisResult, StanceMapError> {
    read_json(path).await
}
