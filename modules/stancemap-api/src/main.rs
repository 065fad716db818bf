use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use stancemap_common::Paths;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stancemap_api::{app, AppState};

#[derive(Parser)]
#[command(name = "stancemap-api", about = "Serve country data and map views to the dashboard")]
struct Args {
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "API_PORT", default_value_t = 3000)]
    port: u16,

    #[arg(long, default_value = "public/national_governments.csv")]
    countries_csv: PathBuf,

    #[arg(long, default_value = "public/latest-analysis.json")]
    latest_analysis: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stancemap=info".parse()?))
        .init();

    let args = Args::parse();
    let state = Arc::new(AppState {
        paths: Paths {
            countries_csv: args.countries_csv,
            latest_analysis: args.latest_analysis,
            ..Paths::default()
        },
    });

    let addr = format!("{}:{}", args.host, args.port);
    info!("StanceMap API starting on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
