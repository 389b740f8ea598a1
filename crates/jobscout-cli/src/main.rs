use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use jobscout_client::BackendProvider;
use jobscout_core::models::QueryInput;
use jobscout_core::{ScrapeOrchestrator, ScrapeQuery, ScraperConfig, SessionLimiter};

#[derive(Parser, Debug)]
#[command(
    name = "jobscout",
    version,
    about = "Search job boards with headless browsers and print the merged listings as JSON"
)]
struct Cli {
    /// Job title to search for
    title: String,

    /// Location to search in
    location: String,

    /// Per-source result cap, 1 to 25 (defaults to JOBSCOUT_DEFAULT_MAX_RESULTS or 10)
    max_results: Option<String>,

    /// Source to search: a source id such as "linkedin", or "all"
    #[arg(short, long, default_value = "all")]
    platform: String,
}

impl From<Cli> for QueryInput {
    fn from(cli: Cli) -> Self {
        Self {
            title: Some(cli.title),
            location: Some(cli.location),
            platform: Some(cli.platform),
            max_results: cli.max_results,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    // Setup tracing; stdout carries only the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ScraperConfig::from_env().context("Invalid configuration")?;
    let registry = Arc::new(config.load_registry()?);

    let query = ScrapeQuery::validate(cli.into(), &registry, config.default_max_results)?;

    let orchestrator = ScrapeOrchestrator::new(
        BackendProvider::from_config(&config)?,
        registry,
        SessionLimiter::new(config.max_browsers),
        config.orchestrator_config(),
    );

    let result = orchestrator
        .scrape(&query)
        .await
        .context("Scrape failed")?;

    tracing::info!(total_found = result.total_found, "Done");
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
