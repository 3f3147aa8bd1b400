use sentinel_core::audit::AuditSink;
use sentinel_orchestrator::{HealingReport, JobQueue, Orchestrator};
use sentinel_query::QuestionEngine;
use sentinel_storage::TemporalGraphStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handles the router's extractors reach into. Thin by design: the facade owns no
/// business logic of its own, only routing and JSON (de)serialization.
pub struct AppContext {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<TemporalGraphStore>,
    pub query_engine: Arc<QuestionEngine>,
    pub healing_report: Arc<HealingReport>,
    pub status: Arc<RwLock<String>>,
    pub stale_days_threshold: i64,
    /// Set only when `JOB_BROKER_URL` is configured; `/ingest` enqueues onto this instead of
    /// calling `process_url` inline.
    pub job_queue: Option<Arc<dyn JobQueue>>,
    pub audit: Arc<dyn AuditSink>,
    /// Flipped to `false` by the task that supervises the healing loop once it exits, whether
    /// from cancellation or a panic. Surfaced on `/health` and `/status`.
    pub healing_alive: Arc<AtomicBool>,
}

impl AppContext {
    pub async fn set_status(&self, message: impl Into<String>) {
        *self.status.write().await = message.into();
    }

    pub fn healing_is_alive(&self) -> bool {
        self.healing_alive.load(Ordering::Relaxed)
    }
}
