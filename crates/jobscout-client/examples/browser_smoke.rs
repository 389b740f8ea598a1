/// Smoke-test for `ChromiumSessionProvider`.
///
/// Launches a headless Chromium, runs one LinkedIn search through the
/// orchestrator, and prints what came back.
///
/// Run with:
///   cargo run -p jobscout-client --example browser_smoke
use std::sync::Arc;

use jobscout_client::{ChromiumSessionProvider, LaunchProfile};
use jobscout_core::models::QueryInput;
use jobscout_core::{
    OrchestratorConfig, ScrapeOrchestrator, ScrapeQuery, SessionLimiter, SourceRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    let registry = Arc::new(SourceRegistry::builtin());
    let query = ScrapeQuery::validate(
        QueryInput {
            title: Some("Rust Developer".into()),
            location: Some("Berlin".into()),
            platform: Some("linkedin".into()),
            max_results: Some("5".into()),
        },
        &registry,
        10,
    )?;

    let orchestrator = ScrapeOrchestrator::new(
        ChromiumSessionProvider::new(LaunchProfile::Local),
        registry,
        SessionLimiter::new(1),
        OrchestratorConfig::default(),
    );

    eprintln!("Launching headless browser…");
    let result = orchestrator.scrape(&query).await?;

    assert!(
        result.total_found <= 5,
        "max_results not honoured: {}",
        result.total_found
    );
    assert!(result.jobs.iter().all(|j| !j.title().is_empty()));

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
