use std::collections::{BTreeSet, HashMap, VecDeque};

/// Edge representation used for path traces: (target_id, relation).
pub type EdgeData = (String, String);

/// Adjacency-list graph index over live edges, used for the question helper's path trace and
/// for computing each node's visualization-friendly degree weight in `snapshot_at`.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyGraph {
    adjacency: HashMap<String, Vec<EdgeData>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self {
            adjacency: HashMap::new(),
        }
    }

    pub fn add_edge(&mut self, source: &str, target: &str, relation: &str) {
        self.adjacency
            .entry(source.to_string())
            .or_default()
            .push((target.to_string(), relation.to_string()));
    }

    pub fn remove_edge(&mut self, source: &str, target: &str, relation: &str) {
        if let Some(edges) = self.adjacency.get_mut(source) {
            edges.retain(|(t, r)| !(t == target && r == relation));
        }
    }

    /// 1-hop neighbors (outgoing edges only).
    pub fn neighbors(&self, id: &str) -> Vec<&EdgeData> {
        self.adjacency
            .get(id)
            .map(|edges| edges.iter().collect())
            .unwrap_or_default()
    }

    /// Degree (outgoing + incoming edge count), used as `snapshot_at`'s node weight.
    pub fn degree(&self, id: &str) -> usize {
        let outgoing = self.adjacency.get(id).map(|e| e.len()).unwrap_or(0);
        let incoming: usize = self
            .adjacency
            .values()
            .map(|edges| edges.iter().filter(|(t, _)| t == id).count())
            .sum();
        outgoing + incoming
    }

    /// BFS outward from `start_id` up to `max_hops`. Returns `(node_id, distance)` pairs,
    /// excluding the start node itself.
    pub fn expand(&self, start_id: &str, max_hops: u8) -> Vec<(String, u8)> {
        if max_hops == 0 {
            return Vec::new();
        }

        let mut visited: HashMap<String, u8> = HashMap::new();
        let mut queue: VecDeque<(String, u8)> = VecDeque::new();
        visited.insert(start_id.to_string(), 0);
        queue.push_back((start_id.to_string(), 0));

        let mut result = Vec::new();

        while let Some((curr, dist)) = queue.pop_front() {
            if dist >= max_hops {
                continue;
            }
            if let Some(edges) = self.adjacency.get(&curr) {
                for (target, _relation) in edges {
                    if !visited.contains_key(target) {
                        visited.insert(target.clone(), dist + 1);
                        result.push((target.clone(), dist + 1));
                        queue.push_back((target.clone(), dist + 1));
                    }
                }
            }
        }

        result
    }

    pub fn node_ids(&self) -> Vec<String> {
        let mut nodes = BTreeSet::new();
        for (source, edges) in &self.adjacency {
            nodes.insert(source.clone());
            for (target, _) in edges {
                nodes.insert(target.clone());
            }
        }
        nodes.into_iter().collect()
    }
}
