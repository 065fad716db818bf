//! Typed configuration for each pipeline stage.
//!
//! Binaries build these from flags and environment at startup and pass them
//! down; nothing in the library crates reads the process environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::StanceMapError;
use crate::topics::{default_topics, validate_topics};
use crate::types::TopicDefinition;

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const ROBOTS_USER_AGENT: &str =
    "globalcoordination.org-bot/1.0 (+https://globalcoordination.org) robots.txt checker";

// --- Prober ---

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub timeout: Duration,
    /// Redirect hops followed before giving up with `<code>_MAX_REDIRECTS`.
    pub max_redirects: usize,
    pub user_agent: String,
    /// Send the full navigation header set a desktop browser sends.
    pub browser_headers: bool,
    /// Rows probed at once.
    pub concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_redirects: 5,
            user_agent: DESKTOP_USER_AGENT.to_string(),
            browser_headers: false,
            concurrency: 1,
        }
    }
}

impl ProbeConfig {
    /// Second pass for rows that came back `403` or `TIMEOUT`.
    pub fn blocked_retry() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            browser_headers: true,
            ..Self::default()
        }
    }

    /// robots.txt requests identify the project and never follow redirects.
    pub fn robots() -> Self {
        Self {
            max_redirects: 0,
            user_agent: ROBOTS_USER_AGENT.to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), StanceMapError> {
        if self.concurrency == 0 {
            return Err(StanceMapError::Config("concurrency must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(StanceMapError::Config("timeout must be positive".into()));
        }
        Ok(())
    }
}

// --- Aggregator ---

/// How the task pool releases work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// A new task starts whenever a running one finishes.
    #[default]
    Rolling,
    /// Fixed-size chunks; a chunk starts only after the previous one settled.
    Batched,
}

impl FromStr for Schedule {
    type Err = StanceMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rolling" => Ok(Schedule::Rolling),
            "batched" | "batch" => Ok(Schedule::Batched),
            other => Err(StanceMapError::Config(format!(
                "unknown schedule \"{other}\" (expected rolling or batched)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Pages rendered at once.
    pub concurrency: usize,
    pub navigation_timeout: Duration,
    /// Fixed wait after navigation for client-side rendering.
    pub settle_delay: Duration,
    /// Upper bound of the random delay before each task starts.
    pub request_delay: Duration,
    pub save_html: bool,
    pub schedule: Schedule,
    pub user_agent: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            navigation_timeout: Duration::from_secs(30),
            settle_delay: Duration::ZERO,
            request_delay: Duration::from_secs(5),
            save_html: true,
            schedule: Schedule::Rolling,
            user_agent: DESKTOP_USER_AGENT.to_string(),
        }
    }
}

impl AggregatorConfig {
    pub fn validate(&self) -> Result<(), StanceMapError> {
        if self.concurrency == 0 {
            return Err(StanceMapError::Config("concurrency must be at least 1".into()));
        }
        if self.navigation_timeout.is_zero() {
            return Err(StanceMapError::Config("timeout must be positive".into()));
        }
        Ok(())
    }
}

// --- Analyzer ---

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Characters of each country's text included in the prompt.
    pub max_chars_per_country: usize,
    pub topics: Vec<TopicDefinition>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 10_000,
            max_chars_per_country: 40_000,
            topics: default_topics(),
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), StanceMapError> {
        validate_topics(&self.topics)?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(StanceMapError::Config(format!(
                "temperature {} out of range 0..=2",
                self.temperature
            )));
        }
        if self.max_chars_per_country == 0 {
            return Err(StanceMapError::Config(
                "max chars per country must be positive".into(),
            ));
        }
        Ok(())
    }
}

// --- Paths ---

/// Where inputs and outputs live on disk.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Holds dated scrape directories and topic/combined result files.
    pub results_root: PathBuf,
    pub countries_csv: PathBuf,
    /// Combined analysis copy served to the dashboard.
    pub latest_analysis: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            results_root: PathBuf::from("results"),
            countries_csv: PathBuf::from("public/national_governments.csv"),
            latest_analysis: PathBuf::from("public/latest-analysis.json"),
        }
    }
}

impl Paths {
    pub fn scrape_dir(&self, date: NaiveDate) -> PathBuf {
        scrape_dir(&self.results_root, date)
    }
}

/// `<root>/<YYYY-MM-DD>`.
pub fn scrape_dir(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(date.format("%Y-%m-%d").to_string())
}
