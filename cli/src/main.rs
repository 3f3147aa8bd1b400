mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Command};
use sentinel_core::audit::{AuditSink, JsonlAuditSink};
use sentinel_core::config::AppConfig;
use sentinel_extract::provider::{select_provider as select_extraction_provider, ExtractionProvider};
use sentinel_extract::Extractor;
use sentinel_orchestrator::Orchestrator;
use sentinel_scrape::{select_provider as select_scrape_provider, Scraper};
use sentinel_storage::TemporalGraphStore;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    sentinel_core::init_tracing();

    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let config = AppConfig::load()?;
    let data_dir = Path::new(&config.graph.graph_uri);
    tokio::fs::create_dir_all(data_dir).await.ok();
    let store = Arc::new(
        TemporalGraphStore::open_with_snapshots(data_dir.join("wal.log"), data_dir.join("snapshots")).await?,
    );

    let audit: Arc<dyn AuditSink> = Arc::new(JsonlAuditSink::open(data_dir.join("audit.log"))?);

    match cli.command {
        Command::Version => unreachable!("handled above"),
        Command::Status => {
            commands::status::run(&store, config.healing.heal_days_threshold).await
        }
        Command::Watch { url } => {
            let orchestrator = build_orchestrator(&config, Arc::clone(&store), Arc::clone(&audit));
            commands::watch::run(&orchestrator, &url).await
        }
        Command::Heal { days } => {
            let orchestrator = build_orchestrator(&config, Arc::clone(&store), Arc::clone(&audit));
            let days = days.unwrap_or(config.healing.heal_days_threshold);
            commands::heal::run(&orchestrator, days).await
        }
    }
}

fn build_orchestrator(config: &AppConfig, store: Arc<TemporalGraphStore>, audit: Arc<dyn AuditSink>) -> Orchestrator {
    let scraper = Arc::new(Scraper::new(select_scrape_provider(config.scraper.scraper_api_key.as_deref())));
    let extraction_provider: Arc<dyn ExtractionProvider> = Arc::new(select_extraction_provider(
        &config.extractor.model_name,
        config.extractor.model_base_url.as_deref(),
    ));
    let extractor = Arc::new(Extractor::new(extraction_provider));
    Orchestrator::new(scraper, extractor, store).with_audit_sink(audit)
}
