use axum::body::Body;
use axum::http::{Request, StatusCode};
use sentinel_core::audit::{AuditSink, InMemoryAuditSink};
use sentinel_extract::provider::select_provider as select_extraction_provider;
use sentinel_extract::Extractor;
use sentinel_httpd::{build_router, AppContext};
use sentinel_orchestrator::{HealingReport, Orchestrator};
use sentinel_query::QuestionEngine;
use sentinel_scrape::{select_provider as select_scrape_provider, Scraper};
use sentinel_storage::TemporalGraphStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::RwLock;
use tower::ServiceExt;

async fn test_context(dir: &std::path::Path, healing_alive: bool) -> Arc<AppContext> {
    let store = Arc::new(TemporalGraphStore::open(dir.join("wal.log")).await.unwrap());
    let scraper = Arc::new(Scraper::new(select_scrape_provider(None)));
    let extractor = Arc::new(Extractor::new(Arc::new(select_extraction_provider("test-model", None))));
    let audit: Arc<dyn AuditSink> = Arc::new(InMemoryAuditSink::default());

    Arc::new(AppContext {
        orchestrator: Arc::new(Orchestrator::new(scraper, extractor, Arc::clone(&store))),
        query_engine: Arc::new(QuestionEngine::new(Arc::clone(&store))),
        store,
        healing_report: Arc::new(HealingReport::default()),
        status: Arc::new(RwLock::new("idle".to_string())),
        stale_days_threshold: 7,
        job_queue: None,
        audit,
        healing_alive: Arc::new(AtomicBool::new(healing_alive)),
    })
}

#[tokio::test]
async fn health_returns_200_when_store_and_healing_loop_are_up() {
    let dir = tempdir().unwrap();
    let ctx = test_context(dir.path(), true).await;
    let router = build_router(ctx);

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_reports_degraded_once_healing_loop_has_stopped() {
    let dir = tempdir().unwrap();
    let ctx = test_context(dir.path(), false).await;
    let router = build_router(ctx);

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["agent_status"], "degraded");
    assert_eq!(json["healing_alive"], false);
}
