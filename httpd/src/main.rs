use sentinel_core::audit::{AuditSink, JsonlAuditSink};
use sentinel_core::config::AppConfig;
use sentinel_extract::provider::{select_provider as select_extraction_provider, ExtractionProvider};
use sentinel_extract::Extractor;
use sentinel_httpd::{build_router, AppContext};
use sentinel_orchestrator::{run_healing_loop, ChannelJobQueue, HealingReport, JobQueue, Orchestrator, Worker};
use sentinel_query::QuestionEngine;
use sentinel_scrape::{select_provider as select_scrape_provider, Scraper};
use sentinel_storage::TemporalGraphStore;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sentinel_core::init_tracing();
    let config = AppConfig::load()?;

    let data_dir = Path::new(&config.graph.graph_uri);
    tokio::fs::create_dir_all(data_dir).await.ok();
    let store = Arc::new(
        TemporalGraphStore::open_with_snapshots(data_dir.join("wal.log"), data_dir.join("snapshots")).await?,
    );

    let audit: Arc<dyn AuditSink> = Arc::new(JsonlAuditSink::open(data_dir.join("audit.log"))?);

    let scraper = Arc::new(Scraper::new(select_scrape_provider(config.scraper.scraper_api_key.as_deref())));
    let extraction_provider: Arc<dyn ExtractionProvider> = Arc::new(select_extraction_provider(
        &config.extractor.model_name,
        config.extractor.model_base_url.as_deref(),
    ));
    let extractor = Arc::new(Extractor::new(extraction_provider));

    let orchestrator = Arc::new(
        Orchestrator::new(scraper, extractor, Arc::clone(&store)).with_audit_sink(Arc::clone(&audit)),
    );
    let query_engine = Arc::new(QuestionEngine::new(Arc::clone(&store)).with_audit_sink(Arc::clone(&audit)));
    let healing_report = Arc::new(HealingReport::default());

    let cancel = CancellationToken::new();
    let healing_task = tokio::spawn(run_healing_loop(
        Arc::clone(&orchestrator),
        Arc::clone(&healing_report),
        config.healing.heal_days_threshold,
        Duration::from_secs(config.healing.heal_interval_hours * 3600),
        config.healing.heal_parallelism,
        cancel.clone(),
    ));
    let healing_alive = Arc::new(AtomicBool::new(true));
    let healing_alive_watcher = Arc::clone(&healing_alive);
    let healing_handle = tokio::spawn(async move {
        if healing_task.await.is_err() {
            tracing::error!("healing loop task panicked");
        }
        healing_alive_watcher.store(false, Ordering::Relaxed);
    });

    let (job_queue, worker_handle): (Option<Arc<dyn JobQueue>>, Option<tokio::task::JoinHandle<()>>) =
        if let Some(broker_url) = &config.jobs.job_broker_url {
            info!(%broker_url, "job queue enabled, ingest will enqueue instead of processing inline");
            let (queue, receiver) = ChannelJobQueue::bounded(256);
            let worker = Worker::new(receiver, Arc::clone(&orchestrator));
            let handle = tokio::spawn(worker.run());
            (Some(Arc::new(queue) as Arc<dyn JobQueue>), Some(handle))
        } else {
            (None, None)
        };

    let ctx = Arc::new(AppContext {
        orchestrator,
        store,
        query_engine,
        healing_report,
        status: Arc::new(RwLock::new("idle".to_string())),
        stale_days_threshold: config.healing.heal_days_threshold,
        job_queue,
        audit,
        healing_alive,
    });

    let router = build_router(ctx);
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "sentinel httpd listening");

    let serve_result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    healing_handle.await.ok();
    if let Some(handle) = worker_handle {
        handle.abort();
    }
    serve_result?;
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
}
