use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use browserless_client::{BrowserlessClient, ContentRequest};
use stancemap_common::AggregatorConfig;
use tracing::{info, warn};

/// Per-page rendering knobs, shared by every renderer.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub user_agent: String,
}

impl From<&AggregatorConfig> for RenderOptions {
    fn from(config: &AggregatorConfig) -> Self {
        Self {
            navigation_timeout: config.navigation_timeout,
            settle_delay: config.settle_delay,
            user_agent: config.user_agent.clone(),
        }
    }
}

// --- PageRenderer trait ---

/// Loads a page in a real browser and returns the DOM after scripts ran.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String>;
    fn name(&self) -> &str;
}

fn check_scheme(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).context("Invalid URL")?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("Only http/https URLs are allowed, got: {}", parsed.scheme());
    }
    Ok(())
}

// --- Browserless ---

/// Renders through a Browserless service; every call gets its own page.
pub struct BrowserlessRenderer {
    client: BrowserlessClient,
}

impl BrowserlessRenderer {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        info!(base_url, "Using BrowserlessRenderer");
        let client =
            BrowserlessClient::new(base_url, token).context("Failed to build Browserless client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for BrowserlessRenderer {
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String> {
        check_scheme(url)?;
        info!(url, renderer = "browserless", "Rendering page");

        let request = ContentRequest::new(url)
            .user_agent(&options.user_agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .navigation_timeout(options.navigation_timeout)
            .settle_delay(options.settle_delay);

        let html = self
            .client
            .content(&request)
            .await
            .context("Browserless content request failed")?;

        if html.trim().is_empty() {
            warn!(url, renderer = "browserless", "Empty HTML response");
        }
        Ok(html)
    }

    fn name(&self) -> &str {
        "browserless"
    }
}

// --- Local Chromium ---

/// Renders with a local headless Chromium (`--dump-dom`), one process per
/// page with a throwaway profile directory.
pub struct ChromeRenderer {
    chrome_bin: PathBuf,
}

impl ChromeRenderer {
    pub fn new(chrome_bin: impl Into<PathBuf>) -> Self {
        let chrome_bin = chrome_bin.into();
        info!(chrome_bin = %chrome_bin.display(), "Using ChromeRenderer");
        Self { chrome_bin }
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String> {
        check_scheme(url)?;
        info!(url, renderer = "chrome", "Rendering page");

        let tmp_dir = tempfile::tempdir().context("Failed to create temp profile dir")?;
        let budget = options.navigation_timeout + options.settle_delay;

        let mut command = tokio::process::Command::new(&self.chrome_bin);
        command
            .args([
                "--headless",
                "--no-sandbox",
                "--disable-gpu",
                "--disable-dev-shm-usage",
            ])
            .arg(format!("--user-data-dir={}", tmp_dir.path().display()))
            .arg(format!("--user-agent={}", options.user_agent));
        if !options.settle_delay.is_zero() {
            command.arg(format!(
                "--virtual-time-budget={}",
                options.settle_delay.as_millis()
            ));
        }
        command.arg("--dump-dom").arg(url).kill_on_drop(true);

        let output = tokio::time::timeout(budget, command.output())
            .await
            .map_err(|_| anyhow::anyhow!("Chrome timed out after {}ms for {url}", budget.as_millis()))?
            .with_context(|| format!("Failed to run Chrome for {url}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(url, renderer = "chrome", stderr = %stderr, "Chrome exited with error");
            anyhow::bail!("Chrome exited with {} for {url}", output.status);
        }

        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            warn!(url, renderer = "chrome", "Empty DOM output");
        }
        Ok(html)
    }

    fn name(&self) -> &str {
        "chrome"
    }
}
