use std::path::{Path, PathBuf};
use std::sync::Arc;

use ai_client::OpenAi;
use anyhow::{Context, Result};
use clap::Args;
use stancemap_analysis::{reverify_file, TopicAnalyzer};
use stancemap_common::artifacts::{latest_scrape_dir, load_country_contents};
use stancemap_common::{AnalyzerConfig, Paths, StanceMapError, TopicDefinition};
use tracing::info;

#[derive(Args)]
pub struct AnalyzeArgs {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    model: String,

    /// OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Scrape run to analyze; defaults to the latest dated directory
    #[arg(long)]
    scrape_dir: Option<PathBuf>,

    /// JSON array of `{"name", "description"}` replacing the built-in topics
    #[arg(long)]
    topics: Option<PathBuf>,

    /// Characters of each country's text sent to the model
    #[arg(long, default_value_t = 40_000)]
    max_chars: usize,
}

#[derive(Args)]
pub struct ReverifyArgs {
    /// Topic files to re-verify in place
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Scrape run to verify against; defaults to the latest dated directory
    #[arg(long)]
    scrape_dir: Option<PathBuf>,
}

async fn resolve_scrape_dir(paths: &Paths, explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    latest_scrape_dir(&paths.results_root)
        .await?
        .ok_or_else(|| StanceMapError::NoScrapeData(paths.results_root.clone()).into())
}

async fn read_topics(path: &Path) -> Result<Vec<TopicDefinition>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read topics file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid topics file {}", path.display()))
}

pub async fn analyze(paths: &Paths, args: AnalyzeArgs) -> Result<()> {
    let api_key = args
        .api_key
        .filter(|k| !k.trim().is_empty())
        .context("OPENAI_API_KEY environment variable required")?;

    let mut config = AnalyzerConfig {
        max_chars_per_country: args.max_chars,
        ..AnalyzerConfig::default()
    };
    if let Some(path) = &args.topics {
        config.topics = read_topics(path).await?;
    }
    config.validate()?;

    let scrape_dir = resolve_scrape_dir(paths, args.scrape_dir).await?;
    let contents = load_country_contents(&scrape_dir).await?;
    info!(dir = %scrape_dir.display(), countries = contents.len(), "Loaded country texts");

    let scrape_label = scrape_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let model = match &args.base_url {
        Some(base_url) => OpenAi::with_base_url(api_key, args.model, base_url.as_str())?,
        None => OpenAi::new(api_key, args.model)?,
    };
    let analyzer = TopicAnalyzer::new(Arc::new(model), config)?;
    let report = analyzer
        .run(&contents, &scrape_label, &paths.results_root, &paths.latest_analysis)
        .await?;

    info!(
        combined = %report.combined_path.display(),
        topics = report.topics.len(),
        model_requests = report.model_requests(),
        "Analysis written"
    );
    Ok(())
}

pub async fn reverify(paths: &Paths, args: ReverifyArgs) -> Result<()> {
    let scrape_dir = resolve_scrape_dir(paths, args.scrape_dir).await?;
    let contents = load_country_contents(&scrape_dir).await?;

    for file in &args.files {
        let summary = reverify_file(file, &contents)
            .await
            .with_context(|| format!("Failed to re-verify {}", file.display()))?;
        info!(
            file = %file.display(),
            verified = summary.verified,
            positions = summary.positions,
            stale = summary.stale,
            "Re-verified"
        );
    }
    Ok(())
}
