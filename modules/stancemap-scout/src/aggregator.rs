use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use stancemap_common::artifacts::write_artifacts;
use stancemap_common::time::iso_timestamp;
use stancemap_common::{AggregatorConfig, CountryRecord, ScrapeMetadata};
use tracing::{info, warn};

use crate::pool::TaskPool;
use crate::renderer::{PageRenderer, RenderOptions};
use crate::text::visible_text;

/// What happened to one country in a scrape run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryOutcome {
    pub code: String,
    pub success: bool,
    pub content_length: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AggregateReport {
    pub scrape_dir: PathBuf,
    pub outcomes: Vec<CountryOutcome>,
}

impl AggregateReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Renders every live ministry homepage and stores its visible text.
pub struct Aggregator {
    renderer: Arc<dyn PageRenderer>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(renderer: Arc<dyn PageRenderer>, config: AggregatorConfig) -> Self {
        Self { renderer, config }
    }

    /// Live records with an http(s) URL. When a code repeats, the first row
    /// wins; artifacts are keyed by code and must not be written twice.
    pub fn select(records: &[CountryRecord]) -> Vec<CountryRecord> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for record in records.iter().filter(|r| r.is_scrapable()) {
            if !seen.insert(record.code.clone()) {
                warn!(
                    code = record.code.as_str(),
                    country = record.name.as_str(),
                    "Duplicate country code, skipping"
                );
                continue;
            }
            selected.push(record.clone());
        }
        selected
    }

    /// Scrape every selectable record into `scrape_dir`. Per-country failures
    /// are recorded as `success: false` artifacts and never end the run.
    pub async fn run(&self, records: &[CountryRecord], scrape_dir: &Path) -> Result<AggregateReport> {
        self.config.validate()?;
        tokio::fs::create_dir_all(scrape_dir)
            .await
            .with_context(|| format!("Failed to create {}", scrape_dir.display()))?;

        let selected = Self::select(records);
        info!(
            countries = selected.len(),
            concurrency = self.config.concurrency,
            schedule = ?self.config.schedule,
            renderer = self.renderer.name(),
            dir = %scrape_dir.display(),
            "Starting scrape run"
        );

        let options = RenderOptions::from(&self.config);
        let pool = TaskPool::new(self.config.concurrency, self.config.schedule)
            .with_jitter(self.config.request_delay);
        let outcomes = pool
            .run(selected, |record| {
                let options = &options;
                async move { self.scrape_one(&record, options, scrape_dir).await }
            })
            .await;

        let report = AggregateReport {
            scrape_dir: scrape_dir.to_path_buf(),
            outcomes,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Scrape run complete"
        );
        Ok(report)
    }

    async fn scrape_one(
        &self,
        record: &CountryRecord,
        options: &RenderOptions,
        dir: &Path,
    ) -> CountryOutcome {
        let started = Instant::now();
        let timestamp = iso_timestamp(Utc::now());
        let code = record.code.as_str();

        let (text, html, error) = match self.renderer.render(&record.ministry_url, options).await {
            Ok(html) => {
                let text = visible_text(&html, Some(&record.ministry_url));
                (text, Some(html), None)
            }
            Err(e) => {
                let message = format!("{e:#}");
                warn!(code, url = record.ministry_url.as_str(), error = message.as_str(), "Scrape failed");
                (format!("Error: {message}"), None, Some(message))
            }
        };

        let metadata = ScrapeMetadata {
            country: record.name.clone(),
            code: record.code.clone(),
            url: record.ministry_url.clone(),
            timestamp,
            success: error.is_none(),
            error: error.clone(),
            content_length: text.chars().count(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        let html = if self.config.save_html { html.as_deref() } else { None };
        if let Err(e) = write_artifacts(dir, code, &text, html, &metadata).await {
            warn!(code, error = %e, "Failed to write artifacts");
            return CountryOutcome {
                code: record.code.clone(),
                success: false,
                content_length: metadata.content_length,
                error: Some(e.to_string()),
            };
        }

        if metadata.success {
            info!(
                code,
                chars = metadata.content_length,
                ms = metadata.processing_time_ms,
                "Scraped"
            );
        }
        CountryOutcome {
            code: record.code.clone(),
            success: metadata.success,
            content_length: metadata.content_length,
            error,
        }
    }
}
