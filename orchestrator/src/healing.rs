use crate::process::Orchestrator;
use sentinel_core::audit::AuditOperation;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const MIN_VENDOR_DELAY: Duration = Duration::from_secs(1);
const ROLLING_REPORT_CAPACITY: usize = 50;

/// A bounded in-memory log of recent healing-cycle failures, surfaced by `/status`.
#[derive(Default)]
pub struct HealingReport {
    failures: Mutex<VecDeque<String>>,
}

impl HealingReport {
    pub async fn record_failure(&self, message: String) {
        let mut failures = self.failures.lock().await;
        if failures.len() == ROLLING_REPORT_CAPACITY {
            failures.pop_front();
        }
        failures.push_back(message);
    }

    pub async fn recent(&self) -> Vec<String> {
        self.failures.lock().await.iter().cloned().collect()
    }
}

/// Repeats `find_stale` → `process_url` → sleep forever, until `cancel` fires. Finishes the
/// in-flight URL before exiting on cancellation.
pub async fn run_healing_loop(
    orchestrator: Arc<Orchestrator>,
    report: Arc<HealingReport>,
    days_threshold: i64,
    interval: Duration,
    parallelism: usize,
    cancel: CancellationToken,
) {
    info!(days_threshold, ?interval, parallelism, "healing loop started");

    loop {
        let urls = orchestrator.store().find_stale(days_threshold).await;
        info!(count = urls.len(), "healing cycle found stale documents");

        if parallelism <= 1 {
            for url in &urls {
                if cancel.is_cancelled() {
                    break;
                }
                heal_one(&orchestrator, &report, url).await;
                tokio::time::sleep(MIN_VENDOR_DELAY).await;
            }
        } else {
            for chunk in urls.chunks(parallelism) {
                if cancel.is_cancelled() {
                    break;
                }
                let started = Instant::now();
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|url| {
                        let orchestrator = Arc::clone(&orchestrator);
                        let report = Arc::clone(&report);
                        let url = url.clone();
                        tokio::spawn(async move { heal_one(&orchestrator, &report, &url).await })
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.await;
                }
                let elapsed = started.elapsed();
                if elapsed < MIN_VENDOR_DELAY {
                    tokio::time::sleep(MIN_VENDOR_DELAY - elapsed).await;
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("healing loop cancelled, exiting");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

async fn heal_one(orchestrator: &Arc<Orchestrator>, report: &Arc<HealingReport>, url: &str) {
    let outcome = orchestrator.process_url_as(url, AuditOperation::Heal).await;
    if outcome.is_failure() {
        let message = format!("{url}: {outcome:?}");
        warn!(%message, "healing cycle recorded a failure");
        report.record_failure(message).await;
    }
}

