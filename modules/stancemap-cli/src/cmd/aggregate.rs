use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Args;
use stancemap_common::{AggregatorConfig, CountryTable, Paths, Schedule};
use stancemap_scout::{Aggregator, BrowserlessRenderer, ChromeRenderer, PageRenderer};
use tracing::{debug, info};

#[derive(Args)]
pub struct AggregateArgs {
    /// Pages rendered at once
    #[arg(long, env = "MAX_CONCURRENCY", default_value_t = 5)]
    concurrency: usize,

    /// Navigation timeout in milliseconds
    #[arg(long, env = "TIMEOUT", default_value_t = 30_000)]
    timeout: u64,

    /// Upper bound of the random delay before each page, in milliseconds
    #[arg(long, env = "REQUEST_DELAY", default_value_t = 5_000)]
    request_delay: u64,

    /// Fixed wait after navigation, in milliseconds
    #[arg(long, default_value_t = 0)]
    settle_delay: u64,

    /// `rolling` or `batched`
    #[arg(long, default_value = "rolling")]
    schedule: Schedule,

    /// Skip writing `<code>.html`
    #[arg(long)]
    no_html: bool,

    /// Scrape run date (directory name); defaults to today (UTC)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Browserless service; a local Chromium is used when unset
    #[arg(long, env = "BROWSERLESS_URL")]
    browserless_url: Option<String>,

    #[arg(long, env = "BROWSERLESS_TOKEN", hide_env_values = true)]
    browserless_token: Option<String>,

    #[arg(long, env = "CHROME_BIN", default_value = "chromium")]
    chrome_bin: PathBuf,

    /// Anything else on the command line is ignored.
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    ignored: Vec<String>,
}

impl AggregateArgs {
    fn config(&self) -> AggregatorConfig {
        AggregatorConfig {
            concurrency: self.concurrency,
            navigation_timeout: Duration::from_millis(self.timeout),
            settle_delay: Duration::from_millis(self.settle_delay),
            request_delay: Duration::from_millis(self.request_delay),
            save_html: !self.no_html,
            schedule: self.schedule,
            ..AggregatorConfig::default()
        }
    }

    fn renderer(&self) -> Result<Arc<dyn PageRenderer>> {
        Ok(match &self.browserless_url {
            Some(url) => Arc::new(BrowserlessRenderer::new(
                url,
                self.browserless_token.as_deref(),
            )?),
            None => Arc::new(ChromeRenderer::new(&self.chrome_bin)),
        })
    }
}

pub async fn run(paths: &Paths, args: AggregateArgs) -> Result<()> {
    if !args.ignored.is_empty() {
        debug!(args = ?args.ignored, "Ignoring unrecognized arguments");
    }

    let config = args.config();
    config.validate()?;

    let table = CountryTable::read(&paths.countries_csv)?;
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let scrape_dir = paths.scrape_dir(date);

    let aggregator = Aggregator::new(args.renderer()?, config);
    let report = aggregator.run(&table.records(), &scrape_dir).await?;

    info!(
        dir = %report.scrape_dir.display(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Aggregation finished"
    );
    Ok(())
}
