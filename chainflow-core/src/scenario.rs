//! Scenario definition types.
//!
//! Scenarios use a small document format (YAML shown, JSON is equivalent):
//!
//! ```yaml
//! key: mint
//! nodes:
//!   - { id: n1, label: "Admin (mint)", x: 40, y: 120 }
//!   - { id: n2, label: "VehicleToken Contract", x: 360, y: 120 }
//! edges:
//!   - { id: e1, source: n1, target: n2, label: "Mint Vehicle Tx" }
//! steps:
//!   - description: "Admin submits the mint transaction"
//!     highlight: [n1, n2]
//! ```
//!
//! Step `k` always activates edge `e{k+1}`, so edges must be numbered in
//! order and there must be exactly one step per edge.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// One of the canned workflows a viewer can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKey {
    Mint,
    Garage,
    Service,
    Transfer,
    Lookup,
}

impl ScenarioKey {
    /// All keys in picker order.
    pub const ALL: [ScenarioKey; 5] = [
        ScenarioKey::Mint,
        ScenarioKey::Garage,
        ScenarioKey::Service,
        ScenarioKey::Transfer,
        ScenarioKey::Lookup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKey::Mint => "mint",
            ScenarioKey::Garage => "garage",
            ScenarioKey::Service => "service",
            ScenarioKey::Transfer => "transfer",
            ScenarioKey::Lookup => "lookup",
        }
    }

    /// Label shown on the picker button.
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKey::Mint => "🚗 Mint Vehicle",
            ScenarioKey::Garage => "🏭 Garage Registration",
            ScenarioKey::Service => "🧰 Add Service Record",
            ScenarioKey::Transfer => "🔁 Ownership Transfer",
            ScenarioKey::Lookup => "🔍 Vehicle History Lookup",
        }
    }

    /// Parses a picker entry: either a key name or its 1-based position.
    pub fn from_picker(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(index) = input.parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|i| Self::ALL.get(i))
                .copied();
        }
        input.parse().ok()
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mint" => Ok(ScenarioKey::Mint),
            "garage" => Ok(ScenarioKey::Garage),
            "service" => Ok(ScenarioKey::Service),
            "transfer" => Ok(ScenarioKey::Transfer),
            "lookup" => Ok(ScenarioKey::Lookup),
            _ => Err(CoreError::UnknownScenario { key: s.to_string() }),
        }
    }
}

/// Canvas position of a node. Only renderers look at it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A node in a scenario graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub position: Position,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            position: Position { x, y },
        }
    }
}

/// A directed edge in a scenario graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: label.into(),
        }
    }
}

/// Narration and node emphasis for one step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StepSpec {
    #[serde(default)]
    pub description: String,
    /// Node ids marked active while this step is current.
    #[serde(default)]
    pub highlight: Vec<String>,
}

impl StepSpec {
    pub fn new<I, S>(description: impl Into<String>, highlight: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            description: description.into(),
            highlight: highlight.into_iter().map(Into::into).collect(),
        }
    }
}

/// Raw scenario as stored in catalog documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRaw {
    pub key: ScenarioKey,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// Validated scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub key: ScenarioKey,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub steps: Vec<StepSpec>,
    /// CRC32C of the canonical JSON encoding.
    pub checksum: String,
}

impl Scenario {
    /// The edge id step `step` activates.
    pub fn edge_id_for_step(step: usize) -> String {
        format!("e{}", step + 1)
    }

    /// Parses and validates a scenario from JSON.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CoreError> {
        let raw: ScenarioRaw = serde_json::from_value(json.clone())?;
        Self::from_raw(raw)
    }

    /// Validates raw parts into a scenario.
    pub fn from_raw(raw: ScenarioRaw) -> Result<Self, CoreError> {
        let key = raw.key.as_str();

        let mut node_ids = HashSet::new();
        for node in &raw.nodes {
            if node.id.is_empty() {
                return Err(CoreError::invalid(key, "node with empty id"));
            }
            if !node_ids.insert(node.id.as_str()) {
                return Err(CoreError::invalid(
                    key,
                    format!("duplicate node id '{}'", node.id),
                ));
            }
        }

        for (k, edge) in raw.edges.iter().enumerate() {
            let expected = Self::edge_id_for_step(k);
            if edge.id != expected {
                return Err(CoreError::invalid(
                    key,
                    format!("edge {} has id '{}', expected '{}'", k, edge.id, expected),
                ));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(CoreError::invalid(
                        key,
                        format!("edge '{}' references unknown node '{}'", edge.id, endpoint),
                    ));
                }
            }
        }

        if raw.steps.len() != raw.edges.len() {
            return Err(CoreError::invalid(
                key,
                format!(
                    "{} step(s) for {} edge(s); every edge needs exactly one step",
                    raw.steps.len(),
                    raw.edges.len()
                ),
            ));
        }

        for (k, step) in raw.steps.iter().enumerate() {
            if let Some(missing) = step
                .highlight
                .iter()
                .find(|id| !node_ids.contains(id.as_str()))
            {
                return Err(CoreError::invalid(
                    key,
                    format!("step {} highlights unknown node '{}'", k, missing),
                ));
            }
        }

        let json_bytes = serde_json::to_vec(&raw)?;
        let checksum = format!("{:08x}", crc32c::crc32c(&json_bytes));

        Ok(Self {
            key: raw.key,
            nodes: raw.nodes,
            edges: raw.edges,
            steps: raw.steps,
            checksum,
        })
    }

    /// Number of transition steps; always equal to the edge count.
    pub fn step_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the edge activated at `step`.
    pub fn edge_for_step(&self, step: usize) -> Option<&Edge> {
        self.edges.get(step)
    }

    /// Returns the step configuration at `step`.
    pub fn step(&self, step: usize) -> Option<&StepSpec> {
        self.steps.get(step)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the raw form for serialization.
    pub fn to_raw(&self) -> ScenarioRaw {
        ScenarioRaw {
            key: self.key,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            steps: self.steps.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scenario() -> serde_json::Value {
        serde_json::json!({
            "key": "mint",
            "nodes": [
                {"id": "n1", "label": "Admin", "x": 40.0, "y": 120.0},
                {"id": "n2", "label": "Contract", "x": 360.0, "y": 120.0},
                {"id": "n3", "label": "Chain", "x": 680.0, "y": 120.0}
            ],
            "edges": [
                {"id": "e1", "source": "n1", "target": "n2", "label": "Tx"},
                {"id": "e2", "source": "n2", "target": "n3", "label": "Validate"}
            ],
            "steps": [
                {"description": "submit", "highlight": ["n1", "n2"]},
                {"description": "validate", "highlight": ["n3"]}
            ]
        })
    }

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_json(&sample_scenario()).unwrap();

        assert_eq!(scenario.key, ScenarioKey::Mint);
        assert_eq!(scenario.nodes.len(), 3);
        assert_eq!(scenario.step_count(), 2);
        assert_eq!(scenario.node("n2").unwrap().position.x, 360.0);
        assert_eq!(scenario.checksum.len(), 8);
    }

    #[test]
    fn test_step_lookup() {
        let scenario = Scenario::from_json(&sample_scenario()).unwrap();

        assert_eq!(scenario.edge_for_step(0).unwrap().id, "e1");
        assert_eq!(scenario.step(1).unwrap().highlight, vec!["n3".to_string()]);
        assert!(scenario.edge_for_step(2).is_none());
        assert_eq!(Scenario::edge_id_for_step(2), "e3");
    }

    #[test]
    fn test_step_count_must_match_edges() {
        let mut json = sample_scenario();
        json["steps"].as_array_mut().unwrap().pop();

        let result = Scenario::from_json(&json);
        assert!(matches!(result, Err(CoreError::InvalidScenario { .. })));
    }

    #[test]
    fn test_misnumbered_edge() {
        let mut json = sample_scenario();
        json["edges"][1]["id"] = serde_json::json!("e7");

        let result = Scenario::from_json(&json);
        assert!(matches!(result, Err(CoreError::InvalidScenario { .. })));
    }

    #[test]
    fn test_dangling_references() {
        let mut json = sample_scenario();
        json["edges"][0]["target"] = serde_json::json!("n9");
        assert!(Scenario::from_json(&json).is_err());

        let mut json = sample_scenario();
        json["steps"][0]["highlight"] = serde_json::json!(["n1", "ghost"]);
        let err = Scenario::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_duplicate_node() {
        let mut json = sample_scenario();
        json["nodes"][2]["id"] = serde_json::json!("n1");

        let result = Scenario::from_json(&json);
        assert!(matches!(result, Err(CoreError::InvalidScenario { .. })));
    }

    #[test]
    fn test_empty_scenario_is_valid() {
        let json = serde_json::json!({"key": "lookup"});
        let scenario = Scenario::from_json(&json).unwrap();
        assert_eq!(scenario.step_count(), 0);
        assert!(scenario.nodes.is_empty());
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!("Mint".parse::<ScenarioKey>().unwrap(), ScenarioKey::Mint);
        assert!("xyz".parse::<ScenarioKey>().is_err());
        assert_eq!(ScenarioKey::from_picker("4"), Some(ScenarioKey::Transfer));
        assert_eq!(ScenarioKey::from_picker("0"), None);
        assert_eq!(ScenarioKey::from_picker("6"), None);
        assert_eq!(ScenarioKey::from_picker(" lookup "), Some(ScenarioKey::Lookup));
    }
}
