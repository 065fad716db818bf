use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StanceMapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Required CSV column not found: {0}")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No scrape results found under {0}")]
    NoScrapeData(PathBuf),
}

impl StanceMapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StanceMapError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StanceMapError::Json {
            path: path.into(),
            source,
        }
    }
}
