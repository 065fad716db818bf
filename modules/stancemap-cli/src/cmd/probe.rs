use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use stancemap_common::{CountryTable, Paths, ProbeConfig};
use stancemap_scout::{maintenance, UrlProber};
use tracing::info;

#[derive(Args)]
pub struct ProbeArgs {
    /// Rows probed at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout: u64,
}

#[derive(Args)]
pub struct RobotsArgs {
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
}

#[derive(Args)]
pub struct RetryArgs {
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
}

fn read_table(paths: &Paths) -> Result<CountryTable> {
    CountryTable::read(&paths.countries_csv)
        .with_context(|| format!("Failed to read {}", paths.countries_csv.display()))
}

pub async fn probe(paths: &Paths, args: ProbeArgs) -> Result<()> {
    let config = ProbeConfig {
        timeout: Duration::from_millis(args.timeout),
        concurrency: args.concurrency,
        ..ProbeConfig::default()
    };
    let prober = UrlProber::new(&config)?;
    let mut table = read_table(paths)?;

    let summary = maintenance::process_urls(&mut table, &prober, config.concurrency).await?;
    table.write(&paths.countries_csv)?;
    info!(
        path = %paths.countries_csv.display(),
        probed = summary.probed,
        live = summary.live,
        "Country table updated"
    );
    Ok(())
}

pub async fn robots(paths: &Paths, args: RobotsArgs) -> Result<()> {
    let config = ProbeConfig {
        concurrency: args.concurrency,
        ..ProbeConfig::robots()
    };
    let prober = UrlProber::new(&config)?;
    let mut table = read_table(paths)?;

    let checked = maintenance::check_robots(&mut table, &prober, config.concurrency).await?;
    table.write(&paths.countries_csv)?;
    info!(checked, "Country table updated with robots.txt status");
    Ok(())
}

pub async fn retry_blocked(paths: &Paths, args: RetryArgs) -> Result<()> {
    let config = ProbeConfig {
        concurrency: args.concurrency,
        ..ProbeConfig::blocked_retry()
    };
    let prober = UrlProber::new(&config)?;
    let mut table = read_table(paths)?;

    let retried = maintenance::retry_blocked(&mut table, &prober, config.concurrency).await?;
    if retried > 0 {
        table.write(&paths.countries_csv)?;
        info!(retried, "Country table updated");
    }
    Ok(())
}
