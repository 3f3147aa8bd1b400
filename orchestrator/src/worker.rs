use crate::process::Orchestrator;
use crate::queue::Job;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Drains the job queue and calls `process_url` per job. Used only when `JOB_BROKER_URL` is
/// configured; otherwise `/ingest` calls the orchestrator inline.
pub struct Worker {
    receiver: mpsc::Receiver<Job>,
    orchestrator: Arc<Orchestrator>,
}

impl Worker {
    pub fn new(receiver: mpsc::Receiver<Job>, orchestrator: Arc<Orchestrator>) -> Self {
        Self { receiver, orchestrator }
    }

    pub async fn run(mut self) {
        info!("orchestrator worker started");
        while let Some(job) = self.receiver.recv().await {
            info!(url = %job.url, "processing queued job");
            let outcome = self.orchestrator.process_url(&job.url).await;
            if outcome.is_failure() {
                error!(url = %job.url, ?outcome, "queued job failed");
            }
        }
        info!("orchestrator worker stopped");
    }
}
