//! Renderer view of the sequencer state.

use crate::scenario::{Position, Scenario, ScenarioKey};
use crate::state::SequencerState;
use serde::{Deserialize, Serialize};

/// Display status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    /// Highlighted earlier in the current run.
    Visited,
    Active,
}

/// Display status of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    #[default]
    Idle,
    Visited,
    /// Animated.
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    pub position: Position,
    pub status: NodeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub status: EdgeStatus,
}

/// Everything a renderer needs to draw one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub scenario: Option<ScenarioKey>,
    /// Step ordinal, `-1` while idle.
    pub step: i64,
    pub total_steps: usize,
    pub description: String,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl Frame {
    /// Frame for an empty canvas.
    pub fn empty(scenario: Option<ScenarioKey>) -> Self {
        Self {
            scenario,
            step: -1,
            total_steps: 0,
            description: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Projects `state` onto `scenario`'s graph. Without a scenario the
    /// canvas is empty.
    pub fn project(scenario: Option<&Scenario>, state: &SequencerState) -> Self {
        let Some(scenario) = scenario else {
            return Self::empty(state.scenario);
        };

        let nodes = scenario
            .nodes
            .iter()
            .map(|node| NodeView {
                id: node.id.clone(),
                label: node.label.clone(),
                position: node.position,
                status: if state.is_node_active(&node.id) {
                    NodeStatus::Active
                } else if state.visited_nodes.contains(&node.id) {
                    NodeStatus::Visited
                } else {
                    NodeStatus::Idle
                },
            })
            .collect();

        let edges = scenario
            .edges
            .iter()
            .map(|edge| EdgeView {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge.label.clone(),
                status: if state.is_edge_active(&edge.id) {
                    EdgeStatus::Active
                } else if state.visited_edges.contains(&edge.id) {
                    EdgeStatus::Visited
                } else {
                    EdgeStatus::Idle
                },
            })
            .collect();

        Self {
            scenario: Some(scenario.key),
            step: state.step_index(),
            total_steps: scenario.step_count(),
            description: state.description.clone(),
            nodes,
            edges,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.step < 0
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = &NodeView> {
        self.nodes.iter().filter(|n| n.status == NodeStatus::Active)
    }

    pub fn active_edge(&self) -> Option<&EdgeView> {
        self.edges.iter().find(|e| e.status == EdgeStatus::Active)
    }

    /// Footer text, e.g. `Currently showing: mint  Step 2 / 3`.
    pub fn status_line(&self) -> String {
        let name = self.scenario.map_or("—", |k| k.as_str());
        if self.step >= 0 {
            format!(
                "Currently showing: {}  Step {} / {}",
                name,
                self.step + 1,
                self.total_steps
            )
        } else {
            format!("Currently showing: {}", name)
        }
    }
}
