use crate::schema::RawExtraction;
use sentinel_core::model::{Bundle, Entity, PropertyMap, PropertyValue, ProposedEdge};
use std::collections::HashSet;

/// Applies the normalization rules to a raw model response: relation casing, dropping edges with
/// a missing endpoint or relation, confidence defaulting/clamping, and synthesizing entities that
/// an edge references but the model forgot to list in `nodes[]`.
pub fn normalize(raw: RawExtraction) -> Bundle {
    let mut entities: Vec<Entity> = raw
        .nodes
        .into_iter()
        .map(|n| Entity {
            id: n.id,
            label: n.label.unwrap_or_else(|| "Entity".to_string()),
            properties: n.properties,
        })
        .collect();
    let mut known_ids: HashSet<String> = entities.iter().map(|e| e.id.clone()).collect();

    let mut edges = Vec::new();
    for raw_edge in raw.edges {
        if raw_edge.source.is_empty() || raw_edge.target.is_empty() || raw_edge.relation.is_empty() {
            continue;
        }

        let relation = normalize_relation(&raw_edge.relation);
        let confidence = raw_edge.confidence.unwrap_or(0.5).clamp(0.0, 1.0);

        for id in [&raw_edge.source, &raw_edge.target] {
            if known_ids.insert(id.clone()) {
                let mut properties = PropertyMap::new();
                properties.insert("name".to_string(), PropertyValue::String(id.clone()));
                entities.push(Entity {
                    id: id.clone(),
                    label: "Entity".to_string(),
                    properties,
                });
            }
        }

        edges.push(ProposedEdge {
            source: raw_edge.source,
            target: raw_edge.target,
            relation,
            properties: raw_edge.properties,
            confidence,
        });
    }

    Bundle { entities, edges }
}

fn normalize_relation(relation: &str) -> String {
    relation
        .trim()
        .to_uppercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawEdge, RawNode};

    #[test]
    fn drops_edges_missing_an_endpoint() {
        let raw = RawExtraction {
            nodes: vec![],
            edges: vec![RawEdge {
                source: "tesla".to_string(),
                target: "".to_string(),
                relation: "FOUNDED_BY".to_string(),
                properties: PropertyMap::new(),
                confidence: Some(0.9),
            }],
        };
        let bundle = normalize(raw);
        assert!(bundle.edges.is_empty());
    }

    #[test]
    fn uppercases_and_underscores_relation() {
        let raw = RawExtraction {
            nodes: vec![],
            edges: vec![RawEdge {
                source: "tesla".to_string(),
                target: "austin".to_string(),
                relation: "located-in".to_string(),
                properties: PropertyMap::new(),
                confidence: None,
            }],
        };
        let bundle = normalize(raw);
        assert_eq!(bundle.edges[0].relation, "LOCATED_IN");
        assert_eq!(bundle.edges[0].confidence, 0.5);
    }

    #[test]
    fn synthesizes_missing_entities() {
        let raw = RawExtraction {
            nodes: vec![RawNode {
                id: "tesla".to_string(),
                label: Some("Company".to_string()),
                properties: PropertyMap::new(),
            }],
            edges: vec![RawEdge {
                source: "tesla".to_string(),
                target: "elon".to_string(),
                relation: "FOUNDED_BY".to_string(),
                properties: PropertyMap::new(),
                confidence: Some(1.5),
            }],
        };
        let bundle = normalize(raw);
        assert_eq!(bundle.entities.len(), 2);
        let elon = bundle.entities.iter().find(|e| e.id == "elon").unwrap();
        assert_eq!(elon.label, "Entity");
        assert_eq!(bundle.edges[0].confidence, 1.0);
    }
}
