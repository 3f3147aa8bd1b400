use crate::context::AppContext;
use crate::error::ApiError;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use sentinel_orchestrator::{Job, ProcessOutcome};
use sentinel_query::{QuestionRequest, QuestionResponse};
use sentinel_storage::{Snapshot, StoreStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IngestResponse {
    Queued { queued: bool, url: String },
    Processed(ProcessOutcome),
}

pub async fn ingest(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    if body.url.trim().is_empty() {
        return Err(ApiError::invalid_argument("url must not be empty"));
    }

    if let Some(queue) = &ctx.job_queue {
        queue
            .enqueue(Job { url: body.url.clone() })
            .await
            .map_err(|err| ApiError::internal(err.to_string()))?;
        info!(url = %body.url, "ingest enqueued");
        return Ok(Json(IngestResponse::Queued { queued: true, url: body.url }));
    }

    ctx.set_status(format!("ingesting {}", body.url)).await;
    let outcome = ctx.orchestrator.process_url(&body.url).await;
    ctx.set_status(format!("idle after {}", body.url)).await;
    info!(url = %body.url, ?outcome, "ingest handled");
    Ok(Json(IngestResponse::Processed(outcome)))
}

#[derive(Debug, Deserialize)]
pub struct SnapshotParams {
    pub timestamp: Option<DateTime<Utc>>,
}

pub async fn snapshot(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<SnapshotParams>,
) -> Json<Snapshot> {
    Json(ctx.store.snapshot_at(params.timestamp).await)
}

pub async fn stats(State(ctx): State<Arc<AppContext>>) -> Json<StoreStats> {
    Json(ctx.store.stats(ctx.stale_days_threshold).await)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub agent_status: &'static str,
    pub node_count: usize,
    pub healing_alive: bool,
}

/// Returns 503 if the store's connectivity probe fails; a degraded but reachable healing loop
/// is reported in the body instead, since the facade itself is still serving traffic.
pub async fn health(State(ctx): State<Arc<AppContext>>) -> Result<Json<HealthResponse>, ApiError> {
    if let Err(err) = ctx.store.health_check().await {
        return Err(ApiError::unavailable(err.to_string()));
    }

    let stats = ctx.store.stats(ctx.stale_days_threshold).await;
    let healing_alive = ctx.healing_is_alive();
    Ok(Json(HealthResponse {
        agent_status: if healing_alive { "running" } else { "degraded" },
        node_count: stats.node_count,
        healing_alive,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub as_of: DateTime<Utc>,
    pub healing_alive: bool,
    pub recent_healing_failures: Vec<String>,
}

pub async fn status(State(ctx): State<Arc<AppContext>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: ctx.status.read().await.clone(),
        as_of: Utc::now(),
        healing_alive: ctx.healing_is_alive(),
        recent_healing_failures: ctx.healing_report.recent().await,
    })
}

pub async fn query(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<QuestionRequest>,
) -> Result<Json<QuestionResponse>, ApiError> {
    body.validate().map_err(|err| ApiError::invalid_argument(err.to_string()))?;
    Ok(Json(ctx.query_engine.answer(&body).await))
}
