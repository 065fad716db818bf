use std::path::{Path, PathBuf};
use std::sync::Arc;

use ai_client::{truncate_chars, ChatModel};
use anyhow::{Context, Result};
use chrono::Utc;
use stancemap_common::time::iso_timestamp;
use stancemap_common::{
    AnalyzerConfig, CombinedAnalysisResult, CountryContent, StanceMapError, TopicAnalysisResult,
    TopicDefinition,
};
use tracing::{info, warn};

use crate::prompt::build_request;
use crate::response::parse_response;
use crate::store;
use crate::verify::verify_all;

/// How one topic was resolved in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRun {
    pub topic: String,
    pub path: PathBuf,
    /// An existing file was reused; no model request was made.
    pub cached: bool,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub topics: Vec<TopicRun>,
    pub combined_path: PathBuf,
    pub combined: CombinedAnalysisResult,
}

impl AnalysisReport {
    pub fn model_requests(&self) -> usize {
        self.topics.iter().filter(|t| !t.cached).count()
    }
}

/// Extracts country stances per topic with a chat model, one topic at a
/// time, caching each topic's result file.
pub struct TopicAnalyzer {
    model: Arc<dyn ChatModel>,
    config: AnalyzerConfig,
}

impl TopicAnalyzer {
    pub fn new(model: Arc<dyn ChatModel>, config: AnalyzerConfig) -> Result<Self, StanceMapError> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn topics(&self) -> &[TopicDefinition] {
        &self.config.topics
    }

    /// Ask the model about one topic and verify what comes back.
    ///
    /// Never fails: a request error or an unparseable reply produces a result
    /// with no countries and the failure described in `dataContext`.
    /// `scrape_label` names the scrape run in the default `dataContext`.
    pub async fn analyze_topic(
        &self,
        topic: &TopicDefinition,
        countries: &[CountryContent],
        scrape_label: &str,
    ) -> TopicAnalysisResult {
        info!(
            topic = topic.name.as_str(),
            countries = countries.len(),
            model = self.model.model(),
            "Analyzing topic"
        );

        let request = build_request(topic, countries, &self.config);
        let (countries_out, data_context) = match self.model.complete(request).await {
            Err(e) => {
                warn!(topic = topic.name.as_str(), error = %e, "Model request failed");
                (Vec::new(), format!("Analysis failed - model request error: {e}"))
            }
            Ok(completion) => {
                if let Some(usage) = completion.usage {
                    info!(
                        topic = topic.name.as_str(),
                        input_tokens = usage.prompt_tokens,
                        output_tokens = usage.completion_tokens,
                        total_tokens = usage.total_tokens,
                        "Token usage"
                    );
                }
                info!(chars = completion.content.len(), "Model response received");

                match parse_response(&completion.content) {
                    Ok(parsed) => {
                        info!(positions = parsed.positions.len(), "Parsed model response");
                        let context = parsed.data_context.unwrap_or_else(|| {
                            format!(
                                "Analysis of {} based on {} foreign ministry websites scraped on {scrape_label}. Content represents official diplomatic positions and priorities as published on government websites.",
                                topic.name,
                                countries.len()
                            )
                        });
                        (parsed.positions, context)
                    }
                    Err(e) => {
                        warn!(
                            topic = topic.name.as_str(),
                            error = %e,
                            raw = truncate_chars(&completion.content, 500),
                            "Failed to parse model response"
                        );
                        (
                            Vec::new(),
                            format!(
                                "Analysis failed - JSON parsing error. Raw response: {}...",
                                truncate_chars(&completion.content, 200)
                            ),
                        )
                    }
                }
            }
        };

        let mut positions = countries_out;
        verify_all(&mut positions, countries);

        let analysis_timestamp = iso_timestamp(Utc::now());
        let source_data_timestamp = countries
            .first()
            .map(|c| c.timestamp.clone())
            .unwrap_or_else(|| analysis_timestamp.clone());

        TopicAnalysisResult {
            topic: topic.name.clone(),
            countries: positions,
            data_context,
            analysis_timestamp,
            source_data_timestamp,
        }
    }

    /// Analyze every configured topic not already on disk, then write the
    /// combined result to `results_root` and to `latest`.
    pub async fn run(
        &self,
        countries: &[CountryContent],
        scrape_label: &str,
        results_root: &Path,
        latest: &Path,
    ) -> Result<AnalysisReport> {
        let existing = store::existing_topic_files(results_root).await?;
        let mut topics = Vec::with_capacity(self.config.topics.len());

        for topic in &self.config.topics {
            let slug = topic.slug();
            if let Some(path) = store::find_cached(&existing, &slug) {
                info!(topic = topic.name.as_str(), path = %path.display(), "Skipping topic, already analyzed");
                topics.push(TopicRun {
                    topic: topic.name.clone(),
                    path,
                    cached: true,
                });
                continue;
            }

            let result = self.analyze_topic(topic, countries, scrape_label).await;
            let path = store::write_topic(results_root, &result, Utc::now())
                .await
                .with_context(|| format!("Failed to save analysis for {}", topic.name))?;
            topics.push(TopicRun {
                topic: topic.name.clone(),
                path,
                cached: false,
            });
        }

        let paths: Vec<PathBuf> = topics.iter().map(|t| t.path.clone()).collect();
        let now = Utc::now();
        let combined = store::combine(&paths, self.config.topics.len(), now).await;
        let combined_path = store::write_combined(results_root, latest, &combined, now).await?;

        info!(
            topics = topics.len(),
            model_requests = topics.iter().filter(|t| !t.cached).count(),
            "Analysis complete"
        );
        Ok(AnalysisReport {
            topics,
            combined_path,
            combined,
        })
    }
}
