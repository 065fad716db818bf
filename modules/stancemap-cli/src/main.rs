//! `stancemap`: run one pipeline stage per invocation.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use stancemap_common::Paths;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "stancemap")]
#[command(about = "Map foreign-ministry stances on world topics")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PathArgs {
    /// Directory holding dated scrape runs and analysis files
    #[arg(long, global = true, default_value = "results")]
    results_dir: PathBuf,

    /// Country table
    #[arg(long, global = true, default_value = "public/national_governments.csv")]
    countries_csv: PathBuf,

    /// Combined analysis copy served to the dashboard
    #[arg(long, global = true, default_value = "public/latest-analysis.json")]
    latest_analysis: PathBuf,
}

impl From<PathArgs> for Paths {
    fn from(args: PathArgs) -> Self {
        Paths {
            results_root: args.results_dir,
            countries_csv: args.countries_csv,
            latest_analysis: args.latest_analysis,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize and probe every ministry URL in the country table
    Probe(cmd::probe::ProbeArgs),

    /// Record robots.txt status for every ministry site
    Robots(cmd::probe::RobotsArgs),

    /// Re-probe rows that came back 403 or TIMEOUT with browser headers
    RetryBlocked(cmd::probe::RetryArgs),

    /// Render every live ministry homepage and store its visible text
    Aggregate(cmd::aggregate::AggregateArgs),

    /// Extract per-topic stances from the latest scrape with a language model
    Analyze(cmd::analyze::AnalyzeArgs),

    /// Recompute quote verification for existing topic files
    Reverify(cmd::analyze::ReverifyArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    let _ = dotenvy::dotenv();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stancemap=info".parse()?))
        .init();

    let paths = Paths::from(cli.paths);
    match cli.command {
        Commands::Probe(args) => cmd::probe::probe(&paths, args).await,
        Commands::Robots(args) => cmd::probe::robots(&paths, args).await,
        Commands::RetryBlocked(args) => cmd::probe::retry_blocked(&paths, args).await,
        Commands::Aggregate(args) => cmd::aggregate::run(&paths, args).await,
        Commands::Analyze(args) => cmd::analyze::analyze(&paths, args).await,
        Commands::Reverify(args) => cmd::analyze::reverify(&paths, args).await,
    }
}
