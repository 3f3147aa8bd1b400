use anyhow::{bail, Result};
use sentinel_orchestrator::{Orchestrator, ProcessOutcome};

pub async fn run(orchestrator: &Orchestrator, url: &str) -> Result<()> {
    let outcome = orchestrator.process_url(url).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if outcome.is_failure() {
        if let ProcessOutcome::ScrapeFailed { reason, .. }
        | ProcessOutcome::ExtractFailed { reason, .. }
        | ProcessOutcome::StoreFailed { reason, .. } = outcome
        {
            bail!("processing {url} failed: {reason}");
        }
    }
    Ok(())
}
