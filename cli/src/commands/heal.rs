use anyhow::Result;
use sentinel_core::audit::AuditOperation;
use sentinel_orchestrator::Orchestrator;

pub async fn run(orchestrator: &Orchestrator, days_threshold: i64) -> Result<()> {
    let urls = orchestrator.store().find_stale(days_threshold).await;
    println!("found {} stale document(s)", urls.len());

    let mut failures = 0usize;
    for url in &urls {
        let outcome = orchestrator.process_url_as(url, AuditOperation::Heal).await;
        if outcome.is_failure() {
            failures += 1;
            println!("FAILED {url}: {outcome:?}");
        } else {
            println!("ok {url}: {outcome:?}");
        }
    }

    println!("healed {} of {}", urls.len() - failures, urls.len());
    Ok(())
}
