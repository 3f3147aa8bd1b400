use sentinel_core::model::PropertyMap;
use serde::Deserialize;

/// The strict JSON shape the model is prompted to return.
#[derive(Debug, Clone, Deserialize)]
pub struct RawExtraction {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEdge {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub properties: PropertyMap,
    pub confidence: Option<f32>,
}

pub fn parse_raw_extraction(text: &str) -> Result<RawExtraction, serde_json::Error> {
    serde_json::from_str(text)
}
