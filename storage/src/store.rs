use crate::index::graph::AdjacencyGraph;
use crate::snapshot::{SnapshotError, SnapshotManager};
use crate::wal::{Wal, WalError};
use chrono::{DateTime, Duration, Utc};
use rkyv::ser::{serializers::AllocSerializer, Serializer};
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use sentinel_core::error::{ErrorCode, SentinelError};
use sentinel_core::model::{Bundle, DocumentState, Entity, TemporalEdge, UpsertStats};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("corrupt WAL entry")]
    CorruptEntry,
    #[error("snapshot manager is not configured")]
    SnapshotNotConfigured,
}

impl SentinelError for StoreError {
    fn error_code(&self) -> ErrorCode {
        match self {
            StoreError::SnapshotNotConfigured => ErrorCode::InvalidArgument,
            _ => ErrorCode::Internal,
        }
    }
}

/// One durable mutation. A bundle's worth of entity/edge changes is appended to the WAL as a
/// single `Transaction` so readers never observe a bundle half-applied.
#[derive(Archive, RkyvDeserialize, RkyvSerialize, Debug, Clone)]
#[archive(check_bytes)]
enum WalOp {
    PutEntity(Entity),
    PutEdge(u64, TemporalEdge),
    SetDocumentState(DocumentState),
    ClearAll,
}

#[derive(Archive, RkyvDeserialize, RkyvSerialize, Debug, Clone)]
#[archive(check_bytes)]
enum WalEntry {
    Transaction(Vec<WalOp>),
}

type EdgeKey = (String, String, String);

#[derive(Default)]
struct MaterializedState {
    entities: HashMap<String, Entity>,
    edges: HashMap<u64, TemporalEdge>,
    live_by_key: HashMap<EdgeKey, u64>,
    by_source_url: HashMap<String, HashSet<u64>>,
    document_states: HashMap<String, DocumentState>,
    next_edge_id: u64,
}

fn apply_op(state: &mut MaterializedState, op: &WalOp) {
    match op {
        WalOp::PutEntity(entity) => {
            state.entities.insert(entity.id.clone(), entity.clone());
        }
        WalOp::PutEdge(id, edge) => {
            let key = (edge.source.clone(), edge.relation.clone(), edge.target.clone());
            if edge.is_live() {
                state.live_by_key.insert(key, *id);
            } else if state.live_by_key.get(&key) == Some(id) {
                state.live_by_key.remove(&key);
            }
            state
                .by_source_url
                .entry(edge.source_url.clone())
                .or_default()
                .insert(*id);
            state.edges.insert(*id, edge.clone());
            state.next_edge_id = state.next_edge_id.max(*id + 1);
        }
        WalOp::SetDocumentState(doc) => {
            state.document_states.insert(doc.source_url.clone(), doc.clone());
        }
        WalOp::ClearAll => {
            state.entities.clear();
            state.edges.clear();
            state.live_by_key.clear();
            state.by_source_url.clear();
            state.document_states.clear();
            state.next_edge_id = 0;
        }
    }
}

/// A point-in-time read view over the graph, as returned by `snapshot_at`.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotNode {
    pub id: String,
    pub label: String,
    pub weight: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotLink {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub confidence: f32,
    pub provenance: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMeta {
    pub as_of: DateTime<Utc>,
    pub node_count: usize,
    pub link_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub nodes: Vec<SnapshotNode>,
    pub links: Vec<SnapshotLink>,
    pub meta: SnapshotMeta,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreStats {
    pub node_count: usize,
    pub live_edge_count: usize,
    pub stale_document_count: usize,
}

/// The bitemporal, content-addressed graph store. Every mutating call is a single write-ahead
/// transaction: the WAL is appended and flushed before in-memory state is touched, so a crash
/// between the two is recovered on the next `open` via replay.
pub struct TemporalGraphStore {
    wal: Arc<Mutex<Wal>>,
    tx_lock: Arc<Mutex<()>>,
    entities: Arc<RwLock<HashMap<String, Entity>>>,
    edges: Arc<RwLock<HashMap<u64, TemporalEdge>>>,
    live_by_key: Arc<RwLock<HashMap<EdgeKey, u64>>>,
    by_source_url: Arc<RwLock<HashMap<String, HashSet<u64>>>>,
    document_states: Arc<RwLock<HashMap<String, DocumentState>>>,
    next_edge_id: Arc<AtomicU64>,
    snapshot_manager: Option<SnapshotManager>,
}

impl TemporalGraphStore {
    pub async fn open(wal_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_internal(wal_path.as_ref().to_path_buf(), None).await
    }

    pub async fn open_with_snapshots(
        wal_path: impl AsRef<Path>,
        snapshot_dir: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let manager = SnapshotManager::new(snapshot_dir.as_ref());
        Self::open_internal(wal_path.as_ref().to_path_buf(), Some(manager)).await
    }

    async fn open_internal(
        wal_path: PathBuf,
        snapshot_manager: Option<SnapshotManager>,
    ) -> Result<Self, StoreError> {
        let mut wal = Wal::open(&wal_path).await?;
        let mut state = MaterializedState::default();
        let mut base_lsn = 0u64;

        if let Some(manager) = &snapshot_manager {
            if let Some((lsn, path)) = manager.latest_snapshot().await? {
                let bytes = tokio::fs::read(&path).await?;
                let archived = rkyv::check_archived_root::<Vec<WalOp>>(&bytes[..])
                    .map_err(|_| StoreError::CorruptEntry)?;
                let ops: Vec<WalOp> = archived
                    .deserialize(&mut rkyv::Infallible)
                    .map_err(|_| StoreError::CorruptEntry)?;
                for op in &ops {
                    apply_op(&mut state, op);
                }
                base_lsn = lsn;
            }
        }

        wal.replay(|lsn, data| {
            if lsn <= base_lsn {
                return Ok(());
            }
            let archived = rkyv::check_archived_root::<WalEntry>(&data[..])
                .map_err(|_| WalError::CorruptEntry)?;
            let entry: WalEntry = archived
                .deserialize(&mut rkyv::Infallible)
                .map_err(|_| WalError::CorruptEntry)?;
            let WalEntry::Transaction(ops) = entry;
            for op in &ops {
                apply_op(&mut state, op);
            }
            Ok(())
        })
        .await?;

        Ok(Self {
            wal: Arc::new(Mutex::new(wal)),
            tx_lock: Arc::new(Mutex::new(())),
            entities: Arc::new(RwLock::new(state.entities)),
            edges: Arc::new(RwLock::new(state.edges)),
            live_by_key: Arc::new(RwLock::new(state.live_by_key)),
            by_source_url: Arc::new(RwLock::new(state.by_source_url)),
            document_states: Arc::new(RwLock::new(state.document_states)),
            next_edge_id: Arc::new(AtomicU64::new(state.next_edge_id)),
            snapshot_manager,
        })
    }

    async fn append_transaction(&self, ops: Vec<WalOp>) -> Result<(), StoreError> {
        let bytes = serialize_wal_entry(&WalEntry::Transaction(ops))?;
        let mut wal = self.wal.lock().await;
        wal.append(&bytes).await?;
        wal.flush().await?;
        Ok(())
    }

    /// Reconciles `bundle` against live state and persists the result as one transaction.
    pub async fn upsert_bundle(
        &self,
        bundle: &Bundle,
        source_url: &str,
    ) -> Result<UpsertStats, StoreError> {
        let _tx_guard = self.tx_lock.lock().await;
        let now = Utc::now();
        let mut stats = UpsertStats::default();
        let mut wal_ops = Vec::new();

        {
            let entities = self.entities.read().await;
            let mut overlay: HashMap<String, (Entity, bool)> = HashMap::new();
            for proposed in &bundle.entities {
                let (merged, created) = match overlay
                    .get(&proposed.id)
                    .map(|(e, c)| (e.clone(), *c))
                    .or_else(|| entities.get(&proposed.id).map(|e| (e.clone(), false)))
                {
                    Some((mut existing, created)) => {
                        existing.merge_from(proposed);
                        (existing, created)
                    }
                    None => (proposed.clone(), true),
                };
                overlay.insert(proposed.id.clone(), (merged, created));
            }
            for (_, (entity, created)) in overlay {
                if created {
                    stats.nodes_created += 1;
                } else {
                    stats.nodes_updated += 1;
                }
                wal_ops.push(WalOp::PutEntity(entity));
            }
        }

        {
            let edges = self.edges.read().await;
            let live_by_key = self.live_by_key.read().await;
            let mut overlay: HashMap<EdgeKey, (u64, TemporalEdge)> = HashMap::new();

            for proposed in &bundle.edges {
                let key = (
                    proposed.source.clone(),
                    proposed.relation.clone(),
                    proposed.target.clone(),
                );
                let current_live = overlay.get(&key).cloned().or_else(|| {
                    live_by_key
                        .get(&key)
                        .and_then(|id| edges.get(id).map(|e| (*id, e.clone())))
                });
                let content_hash = proposed.content_hash();

                match current_live {
                    Some((id, mut live_edge)) if live_edge.content_hash == content_hash => {
                        live_edge.last_verified = now;
                        live_edge.verification_count += 1;
                        live_edge.source_url = source_url.to_string();
                        stats.edges_verified += 1;
                        overlay.insert(key, (id, live_edge));
                    }
                    Some((old_id, mut closed_edge)) => {
                        closed_edge.valid_to = Some(now);
                        stats.edges_invalidated += 1;
                        wal_ops.push(WalOp::PutEdge(old_id, closed_edge));

                        let new_id = self.next_edge_id.fetch_add(1, Ordering::SeqCst);
                        let new_edge = new_live_edge(proposed, now, source_url, content_hash);
                        stats.edges_created += 1;
                        overlay.insert(key, (new_id, new_edge));
                    }
                    None => {
                        let new_id = self.next_edge_id.fetch_add(1, Ordering::SeqCst);
                        let new_edge = new_live_edge(proposed, now, source_url, content_hash);
                        stats.edges_created += 1;
                        overlay.insert(key, (new_id, new_edge));
                    }
                }
            }

            for (_, (id, edge)) in overlay {
                wal_ops.push(WalOp::PutEdge(id, edge));
            }
        }

        if wal_ops.is_empty() {
            return Ok(stats);
        }

        self.append_transaction(wal_ops.clone()).await?;

        let mut entities = self.entities.write().await;
        let mut edges = self.edges.write().await;
        let mut live_by_key = self.live_by_key.write().await;
        let mut by_source_url = self.by_source_url.write().await;
        let mut state = MaterializedState {
            entities: std::mem::take(&mut entities),
            edges: std::mem::take(&mut edges),
            live_by_key: std::mem::take(&mut live_by_key),
            by_source_url: std::mem::take(&mut by_source_url),
            document_states: HashMap::new(),
            next_edge_id: 0,
        };
        for op in &wal_ops {
            apply_op(&mut state, op);
        }
        *entities = state.entities;
        *edges = state.edges;
        *live_by_key = state.live_by_key;
        *by_source_url = state.by_source_url;

        Ok(stats)
    }

    /// Live edges + reachable entities as of `t` (defaults to now).
    pub async fn snapshot_at(&self, t: Option<DateTime<Utc>>) -> Snapshot {
        let t = t.unwrap_or_else(Utc::now);
        let edges = self.edges.read().await;
        let entities = self.entities.read().await;

        let mut graph = AdjacencyGraph::new();
        let mut links = Vec::new();
        for edge in edges.values() {
            if !edge.live_at(t) {
                continue;
            }
            graph.add_edge(&edge.source, &edge.target, &edge.relation);
            links.push(SnapshotLink {
                source: edge.source.clone(),
                target: edge.target.clone(),
                relation: edge.relation.clone(),
                confidence: edge.confidence,
                provenance: edge.source_url.clone(),
                valid_from: edge.valid_from,
                valid_to: edge.valid_to,
            });
        }

        let nodes: Vec<SnapshotNode> = graph
            .node_ids()
            .into_iter()
            .map(|id| {
                let label = entities
                    .get(&id)
                    .map(|e| e.label.clone())
                    .unwrap_or_default();
                let weight = graph.degree(&id);
                SnapshotNode { id, label, weight }
            })
            .collect();

        let meta = SnapshotMeta {
            as_of: t,
            node_count: nodes.len(),
            link_count: links.len(),
        };

        Snapshot { nodes, links, meta }
    }

    /// The current live graph, used by path-trace queries.
    pub async fn live_graph(&self) -> AdjacencyGraph {
        let edges = self.edges.read().await;
        let mut graph = AdjacencyGraph::new();
        for edge in edges.values().filter(|e| e.is_live()) {
            graph.add_edge(&edge.source, &edge.target, &edge.relation);
        }
        graph
    }

    pub async fn get_entity(&self, id: &str) -> Option<Entity> {
        self.entities.read().await.get(id).cloned()
    }

    /// Cheap connectivity probe for `/health`: flushes the WAL's buffered writer, which touches
    /// the underlying file handle and surfaces a broken data directory (disk full, unmounted
    /// volume, permissions revoked) as an error instead of silently reporting healthy.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let mut wal = self.wal.lock().await;
        wal.flush().await?;
        Ok(())
    }

    /// Node/edge/stale counts for `/stats`.
    pub async fn stats(&self, stale_days_threshold: i64) -> StoreStats {
        let node_count = self.entities.read().await.len();
        let live_edge_count = self.edges.read().await.values().filter(|e| e.is_live()).count();
        let stale_document_count = self.find_stale(stale_days_threshold).await.len();
        StoreStats {
            node_count,
            live_edge_count,
            stale_document_count,
        }
    }

    /// Closed edges, most recently invalidated first. Used by the "what changed" question
    /// intent, which has no live-snapshot counterpart to draw on.
    pub async fn recent_changes(&self, limit: usize) -> Vec<TemporalEdge> {
        let edges = self.edges.read().await;
        let mut closed: Vec<TemporalEdge> = edges
            .values()
            .filter(|e| e.valid_to.is_some())
            .cloned()
            .collect();
        closed.sort_by_key(|e| std::cmp::Reverse(e.valid_to));
        closed.truncate(limit);
        closed
    }

    /// Source URLs whose live edges are *all* older than `days_threshold`. A URL with at least
    /// one freshly verified live edge is not stale, even if it has older live edges too.
    pub async fn find_stale(&self, days_threshold: i64) -> Vec<String> {
        let cutoff = Utc::now() - Duration::days(days_threshold);
        let edges = self.edges.read().await;
        let by_source_url = self.by_source_url.read().await;

        let mut stale: Vec<String> = by_source_url
            .iter()
            .filter_map(|(url, ids)| {
                let live: Vec<&TemporalEdge> = ids
                    .iter()
                    .filter_map(|id| edges.get(id))
                    .filter(|e| e.is_live())
                    .collect();
                if live.is_empty() {
                    return None;
                }
                live.iter()
                    .all(|e| e.last_verified < cutoff)
                    .then(|| url.clone())
            })
            .collect();
        stale.sort();
        stale
    }

    /// Re-verifies every live edge sourced from `source_url`. Returns the count touched.
    pub async fn mark_verified(&self, source_url: &str) -> Result<usize, StoreError> {
        let _tx_guard = self.tx_lock.lock().await;
        let now = Utc::now();

        let mut wal_ops = Vec::new();
        {
            let edges = self.edges.read().await;
            let by_source_url = self.by_source_url.read().await;
            if let Some(ids) = by_source_url.get(source_url) {
                for id in ids {
                    if let Some(edge) = edges.get(id).filter(|e| e.is_live()) {
                        let mut touched = edge.clone();
                        touched.last_verified = now;
                        touched.verification_count += 1;
                        wal_ops.push(WalOp::PutEdge(*id, touched));
                    }
                }
            }
        }

        let touched_count = wal_ops.len();
        if touched_count == 0 {
            return Ok(0);
        }

        self.append_transaction(wal_ops.clone()).await?;

        let mut edges = self.edges.write().await;
        for op in &wal_ops {
            if let WalOp::PutEdge(id, edge) = op {
                edges.insert(*id, edge.clone());
            }
        }

        Ok(touched_count)
    }

    pub async fn get_document_state(&self, source_url: &str) -> Option<DocumentState> {
        self.document_states.read().await.get(source_url).cloned()
    }

    pub async fn set_document_state(
        &self,
        source_url: &str,
        content_hash: &str,
    ) -> Result<(), StoreError> {
        let _tx_guard = self.tx_lock.lock().await;
        let doc = DocumentState {
            source_url: source_url.to_string(),
            content_hash: content_hash.to_string(),
            last_checked: Utc::now(),
        };
        self.append_transaction(vec![WalOp::SetDocumentState(doc.clone())])
            .await?;
        self.document_states
            .write()
            .await
            .insert(source_url.to_string(), doc);
        Ok(())
    }

    /// Closes the live edge between `source` and `target` over `relation`, if one exists.
    pub async fn invalidate(
        &self,
        source: &str,
        relation: &str,
        target: &str,
        at_time: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let _tx_guard = self.tx_lock.lock().await;
        let key = (source.to_string(), relation.to_string(), target.to_string());

        let closed = {
            let edges = self.edges.read().await;
            let live_by_key = self.live_by_key.read().await;
            live_by_key.get(&key).and_then(|id| {
                edges.get(id).map(|e| {
                    let mut closed = e.clone();
                    closed.valid_to = Some(at_time);
                    (*id, closed)
                })
            })
        };

        let Some((id, closed_edge)) = closed else {
            return Ok(false);
        };

        self.append_transaction(vec![WalOp::PutEdge(id, closed_edge.clone())])
            .await?;
        self.edges.write().await.insert(id, closed_edge);
        self.live_by_key.write().await.remove(&key);

        Ok(true)
    }

    /// Drops all entities, edges and document state. Returns the number of edges removed.
    pub async fn clear_all(&self) -> Result<usize, StoreError> {
        let _tx_guard = self.tx_lock.lock().await;
        let removed = self.edges.read().await.len();

        self.append_transaction(vec![WalOp::ClearAll]).await?;

        self.entities.write().await.clear();
        self.edges.write().await.clear();
        self.live_by_key.write().await.clear();
        self.by_source_url.write().await.clear();
        self.document_states.write().await.clear();
        self.next_edge_id.store(0, Ordering::SeqCst);

        Ok(removed)
    }

    /// Materializes current state to a backup snapshot file at the WAL's current LSN, so recovery
    /// can replay only the tail instead of the whole log.
    pub async fn create_backup_snapshot(&self) -> Result<String, StoreError> {
        let manager = self
            .snapshot_manager
            .as_ref()
            .ok_or(StoreError::SnapshotNotConfigured)?;

        let _tx_guard = self.tx_lock.lock().await;
        let lsn = self.wal.lock().await.current_lsn();

        let mut ops = Vec::new();
        for entity in self.entities.read().await.values() {
            ops.push(WalOp::PutEntity(entity.clone()));
        }
        for (id, edge) in self.edges.read().await.iter() {
            ops.push(WalOp::PutEdge(*id, edge.clone()));
        }
        for doc in self.document_states.read().await.values() {
            ops.push(WalOp::SetDocumentState(doc.clone()));
        }

        let bytes = serialize_snapshot_ops(&ops)?;
        manager.create_snapshot(lsn, &bytes).await?;

        Ok(format!("wal-lsn-{lsn}"))
    }
}

fn serialize_wal_entry(entry: &WalEntry) -> Result<Vec<u8>, StoreError> {
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(entry)
        .map_err(|_| StoreError::CorruptEntry)?;
    Ok(serializer.into_serializer().into_inner().to_vec())
}

fn serialize_snapshot_ops(ops: &Vec<WalOp>) -> Result<Vec<u8>, StoreError> {
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(ops)
        .map_err(|_| StoreError::CorruptEntry)?;
    Ok(serializer.into_serializer().into_inner().to_vec())
}

fn new_live_edge(
    proposed: &sentinel_core::model::ProposedEdge,
    now: DateTime<Utc>,
    source_url: &str,
    content_hash: String,
) -> TemporalEdge {
    TemporalEdge {
        content_hash,
        source: proposed.source.clone(),
        target: proposed.target.clone(),
        relation: proposed.relation.clone(),
        properties: proposed.properties.clone(),
        valid_from: now,
        valid_to: None,
        last_verified: now,
        verification_count: 1,
        source_url: source_url.to_string(),
        confidence: proposed.confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::model::{Entity, PropertyMap, ProposedEdge};
    use tempfile::tempdir;

    fn edge(source: &str, relation: &str, target: &str, value: &str) -> ProposedEdge {
        let mut properties = PropertyMap::new();
        properties.insert(
            "note".to_string(),
            sentinel_core::model::PropertyValue::String(value.to_string()),
        );
        ProposedEdge {
            source: source.to_string(),
            relation: relation.to_string(),
            target: target.to_string(),
            properties,
            confidence: 0.9,
        }
    }

    #[tokio::test]
    async fn case_a_reasserting_same_content_only_verifies() {
        let dir = tempdir().unwrap();
        let store = TemporalGraphStore::open(dir.path().join("test.wal"))
            .await
            .unwrap();

        let bundle = Bundle {
            entities: vec![Entity::new("tesla", "Company")],
            edges: vec![edge("tesla", "LOCATED_IN", "austin", "v1")],
        };

        let first = store.upsert_bundle(&bundle, "https://a.example").await.unwrap();
        assert_eq!(first.edges_created, 1);

        let second = store.upsert_bundle(&bundle, "https://b.example").await.unwrap();
        assert_eq!(second.edges_created, 0);
        assert_eq!(second.edges_verified, 1);

        let snapshot = store.snapshot_at(None).await;
        assert_eq!(snapshot.links.len(), 1);
        assert_eq!(snapshot.links[0].provenance, "https://b.example");
    }

    #[tokio::test]
    async fn case_b_changed_content_closes_old_and_creates_new() {
        let dir = tempdir().unwrap();
        let store = TemporalGraphStore::open(dir.path().join("test.wal"))
            .await
            .unwrap();

        let first_bundle = Bundle {
            entities: vec![],
            edges: vec![edge("openai", "CEO_OF", "sam_altman", "2023")],
        };
        store.upsert_bundle(&first_bundle, "https://a.example").await.unwrap();

        let second_bundle = Bundle {
            entities: vec![],
            edges: vec![edge("openai", "CEO_OF", "sam_altman", "2024")],
        };
        let stats = store.upsert_bundle(&second_bundle, "https://a.example").await.unwrap();

        assert_eq!(stats.edges_invalidated, 1);
        assert_eq!(stats.edges_created, 1);

        let snapshot = store.snapshot_at(None).await;
        assert_eq!(snapshot.links.len(), 1);
    }

    #[tokio::test]
    async fn find_stale_ignores_urls_with_a_fresh_live_edge() {
        let dir = tempdir().unwrap();
        let store = TemporalGraphStore::open(dir.path().join("test.wal"))
            .await
            .unwrap();

        let bundle = Bundle {
            entities: vec![],
            edges: vec![edge("a", "KNOWS", "b", "x")],
        };
        store.upsert_bundle(&bundle, "https://fresh.example").await.unwrap();

        let stale = store.find_stale(7).await;
        assert!(stale.is_empty());
    }

    #[tokio::test]
    async fn invalidate_closes_live_edge() {
        let dir = tempdir().unwrap();
        let store = TemporalGraphStore::open(dir.path().join("test.wal"))
            .await
            .unwrap();

        let bundle = Bundle {
            entities: vec![],
            edges: vec![edge("a", "KNOWS", "b", "x")],
        };
        store.upsert_bundle(&bundle, "https://a.example").await.unwrap();

        let closed = store.invalidate("a", "KNOWS", "b", Utc::now()).await.unwrap();
        assert!(closed);

        let snapshot = store.snapshot_at(None).await;
        assert!(snapshot.links.is_empty());
    }

    #[tokio::test]
    async fn recovers_state_from_wal_replay() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("test.wal");

        {
            let store = TemporalGraphStore::open(&wal_path).await.unwrap();
            let bundle = Bundle {
                entities: vec![Entity::new("a", "Thing")],
                edges: vec![edge("a", "KNOWS", "b", "x")],
            };
            store.upsert_bundle(&bundle, "https://a.example").await.unwrap();
        }

        let reopened = TemporalGraphStore::open(&wal_path).await.unwrap();
        let snapshot = reopened.snapshot_at(None).await;
        assert_eq!(snapshot.links.len(), 1);
        assert!(reopened.get_entity("a").await.is_some());
    }

    #[tokio::test]
    async fn health_check_succeeds_against_an_open_wal() {
        let dir = tempdir().unwrap();
        let store = TemporalGraphStore::open(dir.path().join("test.wal")).await.unwrap();
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn stats_counts_nodes_live_edges_and_stale_documents() {
        let dir = tempdir().unwrap();
        let store = TemporalGraphStore::open(dir.path().join("test.wal")).await.unwrap();

        let bundle = Bundle {
            entities: vec![Entity::new("tesla", "Company"), Entity::new("austin", "City")],
            edges: vec![edge("tesla", "LOCATED_IN", "austin", "v1")],
        };
        store.upsert_bundle(&bundle, "https://a.example").await.unwrap();

        let stats = store.stats(7).await;
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.live_edge_count, 1);
        assert_eq!(stats.stale_document_count, 0);
    }

    #[tokio::test]
    async fn recent_changes_excludes_live_edges_and_orders_by_closure_time() {
        let dir = tempdir().unwrap();
        let store = TemporalGraphStore::open(dir.path().join("test.wal")).await.unwrap();

        let first = Bundle {
            entities: vec![],
            edges: vec![edge("openai", "CEO_OF", "sam_altman", "2023")],
        };
        store.upsert_bundle(&first, "https://a.example").await.unwrap();
        let second = Bundle {
            entities: vec![],
            edges: vec![edge("openai", "CEO_OF", "sam_altman", "2024")],
        };
        store.upsert_bundle(&second, "https://a.example").await.unwrap();

        let changes = store.recent_changes(10).await;
        assert_eq!(changes.len(), 1);
        assert!(changes[0].valid_to.is_some());
    }
}
