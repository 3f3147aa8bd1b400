use chrono::{DateTime, Utc};
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A scalar property value. `BTreeMap` keys are already sorted, so serializing a `PropertyMap`
/// through `serde_json` yields the canonical form the edge content hash depends on.
#[derive(Archive, RkyvDeserialize, RkyvSerialize, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[archive(check_bytes)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Bool(bool),
}

pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// An entity node. Identity is the caller-supplied `id`; `properties` merge last-writer-wins.
#[derive(Archive, RkyvDeserialize, RkyvSerialize, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub properties: PropertyMap,
}

impl Entity {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Union `other`'s properties into `self`, with `other` winning on key collision.
    pub fn merge_from(&mut self, other: &Entity) {
        if !other.label.is_empty() {
            self.label = other.label.clone();
        }
        for (k, v) in &other.properties {
            self.properties.insert(k.clone(), v.clone());
        }
    }
}

/// An edge proposed by a bundle, prior to being reconciled against live store state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
    #[serde(default)]
    pub properties: PropertyMap,
    pub confidence: f32,
}

impl ProposedEdge {
    pub fn content_hash(&self) -> String {
        edge_content_hash(&self.source, &self.relation, &self.target, &self.properties)
    }
}

/// Zero-or-more entities and zero-or-more proposed edges applied as one logical assertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub edges: Vec<ProposedEdge>,
}

impl Bundle {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.edges.is_empty()
    }
}

/// A bitemporal, content-addressed edge as persisted by the store.
#[derive(Archive, RkyvDeserialize, RkyvSerialize, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct TemporalEdge {
    pub content_hash: String,
    pub source: String,
    pub target: String,
    pub relation: String,
    pub properties: PropertyMap,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub last_verified: DateTime<Utc>,
    pub verification_count: u64,
    pub source_url: String,
    pub confidence: f32,
}

impl TemporalEdge {
    pub fn is_live(&self) -> bool {
        self.valid_to.is_none()
    }

    pub fn live_at(&self, t: DateTime<Utc>) -> bool {
        self.valid_from <= t && self.valid_to.map(|vt| vt > t).unwrap_or(true)
    }
}

/// Most recently observed content hash for a scraped source.
#[derive(Archive, RkyvDeserialize, RkyvSerialize, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct DocumentState {
    pub source_url: String,
    pub content_hash: String,
    pub last_checked: DateTime<Utc>,
}

/// Aggregate counts returned by `upsert_bundle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertStats {
    pub nodes_created: usize,
    pub nodes_updated: usize,
    pub edges_created: usize,
    pub edges_verified: usize,
    pub edges_invalidated: usize,
}

/// `H = SHA256(source ‖ relation ‖ target ‖ canonical_json(properties))`.
///
/// Excludes `source_url` and `confidence` by design: identical content asserted from two
/// different documents is the same edge, not two.
pub fn edge_content_hash(source: &str, relation: &str, target: &str, properties: &PropertyMap) -> String {
    let canonical_props =
        serde_json::to_string(properties).expect("property maps are always json-serializable");

    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(relation.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(target.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(canonical_props.as_bytes());

    hex::encode(hasher.finalize())
}

/// SHA256 of scraped document text; used for unchanged-document detection.
pub fn document_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::String(v.to_string())))
            .collect()
    }

    #[test]
    fn content_hash_is_stable_regardless_of_insertion_order() {
        let mut a = PropertyMap::new();
        a.insert("year".to_string(), PropertyValue::String("2003".to_string()));
        a.insert("city".to_string(), PropertyValue::String("austin".to_string()));

        let mut b = PropertyMap::new();
        b.insert("city".to_string(), PropertyValue::String("austin".to_string()));
        b.insert("year".to_string(), PropertyValue::String("2003".to_string()));

        assert_eq!(
            edge_content_hash("tesla", "FOUNDED_BY", "elon", &a),
            edge_content_hash("tesla", "FOUNDED_BY", "elon", &b)
        );
    }

    #[test]
    fn content_hash_differs_on_property_change() {
        let h1 = edge_content_hash("tesla", "LOCATED_IN", "austin", &props(&[("since", "2021")]));
        let h2 = edge_content_hash("tesla", "LOCATED_IN", "austin", &props(&[("since", "2022")]));
        assert_ne!(h1, h2);
    }

    #[test]
    fn content_hash_excludes_source_url_and_confidence() {
        let edge_a = ProposedEdge {
            source: "openai".to_string(),
            target: "sam_altman".to_string(),
            relation: "CEO_OF".to_string(),
            properties: PropertyMap::new(),
            confidence: 0.9,
        };
        let edge_b = ProposedEdge {
            confidence: 0.4,
            ..edge_a.clone()
        };
        assert_eq!(edge_a.content_hash(), edge_b.content_hash());
    }
}
