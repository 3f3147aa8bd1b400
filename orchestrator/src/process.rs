use sentinel_core::audit::{AuditEvent, AuditOperation, AuditOutcome, AuditSink};
use sentinel_core::model::UpsertStats;
use sentinel_extract::Extractor;
use sentinel_scrape::Scraper;
use sentinel_storage::TemporalGraphStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessOutcome {
    Success { url: String, stats: UpsertStats },
    UnchangedVerified { url: String, edges_updated: usize },
    NoFacts { url: String },
    ScrapeFailed { url: String, reason: String },
    ExtractFailed { url: String, reason: String },
    StoreFailed { url: String, reason: String },
}

impl ProcessOutcome {
    pub fn url(&self) -> &str {
        match self {
            ProcessOutcome::Success { url, .. }
            | ProcessOutcome::UnchangedVerified { url, .. }
            | ProcessOutcome::NoFacts { url }
            | ProcessOutcome::ScrapeFailed { url, .. }
            | ProcessOutcome::ExtractFailed { url, .. }
            | ProcessOutcome::StoreFailed { url, .. } => url,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProcessOutcome::ScrapeFailed { .. }
                | ProcessOutcome::ExtractFailed { .. }
                | ProcessOutcome::StoreFailed { .. }
        )
    }
}

/// The per-URL state machine: FETCH, COMPARE, (VERIFY | EXTRACT → UPSERT).
pub struct Orchestrator {
    scraper: Arc<Scraper>,
    extractor: Arc<Extractor>,
    store: Arc<TemporalGraphStore>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl Orchestrator {
    pub fn new(scraper: Arc<Scraper>, extractor: Arc<Extractor>, store: Arc<TemporalGraphStore>) -> Self {
        Self {
            scraper,
            extractor,
            store,
            audit: None,
        }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Entry point for directly-requested ingests (`/ingest`, queued jobs, the `watch` command).
    pub async fn process_url(&self, url: &str) -> ProcessOutcome {
        self.process_url_as(url, AuditOperation::Ingest).await
    }

    /// Same state machine as `process_url`, recorded under `operation` in the audit log. The
    /// healing loop calls this with `AuditOperation::Heal` so offline review can distinguish a
    /// scheduled re-verification from a directly requested ingest.
    pub async fn process_url_as(&self, url: &str, operation: AuditOperation) -> ProcessOutcome {
        let outcome = self.process_url_inner(url).await;
        self.record_audit(operation, &outcome);
        outcome
    }

    fn record_audit(&self, operation: AuditOperation, outcome: &ProcessOutcome) {
        let Some(sink) = &self.audit else { return };
        let audit_outcome = if outcome.is_failure() { AuditOutcome::Failed } else { AuditOutcome::Succeeded };
        let mut event = AuditEvent::new(operation, audit_outcome);
        event.metadata.insert("url".to_string(), outcome.url().to_string());
        if let Err(err) = sink.record(event) {
            warn!(%err, "failed to record audit event");
        }
    }

    async fn process_url_inner(&self, url: &str) -> ProcessOutcome {
        let doc = match self.scraper.scrape(url).await {
            Ok(doc) => doc,
            Err(err) => {
                warn!(url, kind = ?err.kind, "scrape failed");
                return ProcessOutcome::ScrapeFailed {
                    url: url.to_string(),
                    reason: err.to_string(),
                };
            }
        };

        let prior = self.store.get_document_state(url).await;
        if prior.as_ref().map(|p| p.content_hash.as_str()) == Some(doc.content_hash.as_str()) {
            let touched = match self.store.mark_verified(url).await {
                Ok(n) => n,
                Err(err) => {
                    return ProcessOutcome::StoreFailed {
                        url: url.to_string(),
                        reason: err.to_string(),
                    }
                }
            };
            if let Err(err) = self.store.set_document_state(url, &doc.content_hash).await {
                return ProcessOutcome::StoreFailed {
                    url: url.to_string(),
                    reason: err.to_string(),
                };
            }
            info!(url, touched, "document unchanged, edges re-verified");
            return ProcessOutcome::UnchangedVerified {
                url: url.to_string(),
                edges_updated: touched,
            };
        }

        let bundle = self.extractor.extract(&doc.content).await;
        if bundle.is_empty() {
            if let Err(err) = self.store.set_document_state(url, &doc.content_hash).await {
                return ProcessOutcome::StoreFailed {
                    url: url.to_string(),
                    reason: err.to_string(),
                };
            }
            return ProcessOutcome::NoFacts { url: url.to_string() };
        }

        let stats = match self.store.upsert_bundle(&bundle, url).await {
            Ok(stats) => stats,
            Err(err) => {
                return ProcessOutcome::StoreFailed {
                    url: url.to_string(),
                    reason: err.to_string(),
                }
            }
        };
        if let Err(err) = self.store.set_document_state(url, &doc.content_hash).await {
            return ProcessOutcome::StoreFailed {
                url: url.to_string(),
                reason: err.to_string(),
            };
        }

        info!(url, ?stats, "document processed");
        ProcessOutcome::Success {
            url: url.to_string(),
            stats,
        }
    }

    pub fn store(&self) -> &Arc<TemporalGraphStore> {
        &self.store
    }
}
