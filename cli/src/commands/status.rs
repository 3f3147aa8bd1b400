use anyhow::Result;
use sentinel_storage::TemporalGraphStore;

pub async fn run(store: &TemporalGraphStore, stale_days_threshold: i64) -> Result<()> {
    let stats = store.stats(stale_days_threshold).await;
    println!("status: running");
    println!("nodes: {}", stats.node_count);
    println!("live edges: {}", stats.live_edge_count);
    println!("stale documents: {}", stats.stale_document_count);
    Ok(())
}
