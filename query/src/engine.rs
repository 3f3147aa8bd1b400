use crate::dsl::{QueryResultRecord, QuestionRequest, QuestionResponse, NO_ANSWER};
use crate::intent::{classify_intent, extract_entities, Intent};
use sentinel_core::audit::{AuditEvent, AuditOperation, AuditOutcome, AuditSink};
use sentinel_storage::{SnapshotLink, TemporalGraphStore};
use std::sync::Arc;
use tracing::warn;

const RESULT_LIMIT: usize = 5;

/// Answers a question against the live (or time-travelled) snapshot. No general NL reasoning:
/// the intent ladder and entity-name heuristic decide which pattern to run, and the answer is a
/// template filled from the first match.
pub struct QuestionEngine {
    store: Arc<TemporalGraphStore>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl QuestionEngine {
    pub fn new(store: Arc<TemporalGraphStore>) -> Self {
        Self { store, audit: None }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub async fn answer(&self, request: &QuestionRequest) -> QuestionResponse {
        let intent = classify_intent(&request.question);
        let entities = extract_entities(&request.question);

        let response = if intent == Intent::Changed {
            let changes = self.store.recent_changes(RESULT_LIMIT).await;
            let results: Vec<QueryResultRecord> = changes.iter().map(to_record).collect();
            QuestionResponse {
                answer: format_answer(intent, &results),
                path: results.iter().flat_map(|r| [r.source.clone(), r.target.clone()]).collect(),
                results,
                query: "closed edges ordered by valid_to desc".to_string(),
            }
        } else {
            let snapshot = self.store.snapshot_at(request.timestamp).await;
            let matches = match_links(&snapshot.links, intent, &entities);
            let results: Vec<QueryResultRecord> = matches
                .into_iter()
                .take(RESULT_LIMIT)
                .map(|l| QueryResultRecord {
                    source: l.source.clone(),
                    relation: l.relation.clone(),
                    target: l.target.clone(),
                    confidence: l.confidence,
                    source_url: l.provenance.clone(),
                    valid_from: l.valid_from,
                    valid_to: l.valid_to,
                })
                .collect();

            QuestionResponse {
                answer: format_answer(intent, &results),
                path: results.iter().flat_map(|r| [r.source.clone(), r.target.clone()]).collect(),
                results,
                query: describe_query(intent, &entities),
            }
        };

        self.record_audit(request, &response);
        response
    }

    fn record_audit(&self, request: &QuestionRequest, response: &QuestionResponse) {
        let Some(sink) = &self.audit else { return };
        let mut event = AuditEvent::new(AuditOperation::Query, AuditOutcome::Succeeded);
        event.metadata.insert("question".to_string(), request.question.clone());
        event.metadata.insert("result_count".to_string(), response.results.len().to_string());
        if let Err(err) = sink.record(event) {
            warn!(%err, "failed to record audit event");
        }
    }
}

fn relation_matches(relation: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| relation.contains(n))
}

fn entity_matches(link: &SnapshotLink, entities: &[String]) -> bool {
    if entities.is_empty() {
        return true;
    }
    entities.iter().any(|e| {
        let e = e.to_lowercase();
        link.source.to_lowercase().contains(&e) || link.target.to_lowercase().contains(&e)
    })
}

fn match_links<'a>(links: &'a [SnapshotLink], intent: Intent, entities: &[String]) -> Vec<&'a SnapshotLink> {
    let mut matched: Vec<&SnapshotLink> = match intent {
        Intent::Price => links.iter().filter(|l| relation_matches(&l.relation, &["COST", "PRICE"])).collect(),
        Intent::Leadership => links.iter().filter(|l| relation_matches(&l.relation, &["CEO", "FOUND"])).collect(),
        Intent::About => links.iter().filter(|l| entity_matches(l, entities)).collect(),
        Intent::Default | Intent::Changed => links.iter().collect(),
    };

    if matches!(intent, Intent::Price | Intent::Leadership) && !entities.is_empty() {
        let with_entity: Vec<&SnapshotLink> = matched.iter().copied().filter(|l| entity_matches(l, entities)).collect();
        if !with_entity.is_empty() {
            matched = with_entity;
        }
    }
    matched
}

fn to_record(edge: &sentinel_core::model::TemporalEdge) -> QueryResultRecord {
    QueryResultRecord {
        source: edge.source.clone(),
        relation: edge.relation.clone(),
        target: edge.target.clone(),
        confidence: edge.confidence,
        source_url: edge.source_url.clone(),
        valid_from: edge.valid_from,
        valid_to: edge.valid_to,
    }
}

fn clean_relation(relation: &str) -> String {
    let lower = relation.to_lowercase().replace('_', " ");
    lower.replace(" by", "")
}

fn format_answer(intent: Intent, results: &[QueryResultRecord]) -> String {
    let Some(first) = results.first() else {
        return NO_ANSWER.to_string();
    };

    match intent {
        Intent::Price => format!("{} costs {}.", first.source, first.target),
        Intent::Leadership => format!("{} {} {}.", first.source, clean_relation(&first.relation), first.target),
        Intent::Changed => {
            let lines: Vec<String> = results
                .iter()
                .take(3)
                .map(|r| {
                    let to_date = r
                        .valid_to
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "recently".to_string());
                    format!("- {} {} {} (changed {})", r.source, clean_relation(&r.relation), r.target, to_date)
                })
                .collect();
            format!("Recent changes:\n{}", lines.join("\n"))
        }
        Intent::About | Intent::Default => {
            format!("{} {} {}.", first.source, clean_relation(&first.relation), first.target)
        }
    }
}

fn describe_query(intent: Intent, entities: &[String]) -> String {
    let pattern = match intent {
        Intent::Price => "live edges with relation matching COST|PRICE",
        Intent::Leadership => "live edges with relation matching CEO|FOUND",
        Intent::About => "live edges touching the extracted entity name(s)",
        Intent::Changed => "closed edges ordered by valid_to desc",
        Intent::Default => "live edges, unfiltered",
    };
    if entities.is_empty() {
        pattern.to_string()
    } else {
        format!("{pattern} [{}]", entities.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sentinel_core::audit::InMemoryAuditSink;
    use sentinel_core::model::{Bundle, Entity, ProposedEdge};
    use tempfile::tempdir;

    async fn seeded_store() -> Arc<TemporalGraphStore> {
        let dir = tempdir().unwrap();
        let store = TemporalGraphStore::open(dir.path().join("wal.log")).await.unwrap();
        let bundle = Bundle {
            entities: vec![Entity::new("tesla", "Company"), Entity::new("elon", "Person")],
            edges: vec![ProposedEdge {
                source: "elon".to_string(),
                target: "tesla".to_string(),
                relation: "FOUNDED_BY".to_string(),
                properties: Default::default(),
                confidence: 0.9,
            }],
        };
        store.upsert_bundle(&bundle, "https://example.com/tesla").await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn answers_leadership_question() {
        let store = seeded_store().await;
        let engine = QuestionEngine::new(store);
        let response = engine
            .answer(&QuestionRequest { question: "Who founded Tesla?".to_string(), timestamp: None })
            .await;
        assert!(response.answer.contains("tesla"));
        assert!(!response.results.is_empty());
    }

    #[tokio::test]
    async fn empty_store_never_invents_facts() {
        let dir = tempdir().unwrap();
        let store = Arc::new(TemporalGraphStore::open(dir.path().join("wal.log")).await.unwrap());
        let engine = QuestionEngine::new(store);
        let response = engine
            .answer(&QuestionRequest { question: "Who is the CEO of Acme?".to_string(), timestamp: None })
            .await;
        assert_eq!(response.answer, NO_ANSWER);
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn timestamp_before_ingest_yields_no_answer() {
        let store = seeded_store().await;
        let engine = QuestionEngine::new(store);
        let past = Utc::now() - chrono::Duration::days(365);
        let response = engine
            .answer(&QuestionRequest {
                question: "Who founded Tesla?".to_string(),
                timestamp: Some(past),
            })
            .await;
        assert_eq!(response.answer, NO_ANSWER);
    }

    #[tokio::test]
    async fn answering_records_a_query_audit_event() {
        let store = seeded_store().await;
        let sink = Arc::new(InMemoryAuditSink::default());
        let engine = QuestionEngine::new(store).with_audit_sink(sink.clone());

        engine
            .answer(&QuestionRequest { question: "Who founded Tesla?".to_string(), timestamp: None })
            .await;

        let events = sink.events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation, sentinel_core::audit::AuditOperation::Query);
        assert_eq!(events[0].outcome, sentinel_core::audit::AuditOutcome::Succeeded);
    }
}
