//! Sequencer state and its pure transitions.
//!
//! The timed player never mutates highlight state directly; it asks
//! [`apply_step`] or [`settle`] for the next state and stores the result.

use crate::error::CoreError;
use crate::scenario::{Scenario, ScenarioKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Logical highlight state at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequencerState {
    /// Selected scenario, if any.
    pub scenario: Option<ScenarioKey>,

    /// Current step, `None` while idle.
    pub step: Option<usize>,

    /// Nodes active at the current step.
    pub active_nodes: BTreeSet<String>,

    /// Edge active at the current step.
    pub active_edge: Option<String>,

    /// Narration for the current step (empty while idle).
    pub description: String,

    /// Every node highlighted so far in this run.
    pub visited_nodes: BTreeSet<String>,

    /// Every edge highlighted so far in this run.
    pub visited_edges: BTreeSet<String>,
}

impl SequencerState {
    /// Idle state with `scenario` selected (or nothing selected).
    pub fn idle(scenario: Option<ScenarioKey>) -> Self {
        Self {
            scenario,
            ..Self::default()
        }
    }

    /// Step ordinal with `-1` meaning idle.
    pub fn step_index(&self) -> i64 {
        self.step.map_or(-1, |s| s as i64)
    }

    pub fn is_idle(&self) -> bool {
        self.step.is_none()
    }

    pub fn is_node_active(&self, id: &str) -> bool {
        self.active_nodes.contains(id)
    }

    pub fn is_edge_active(&self, id: &str) -> bool {
        self.active_edge.as_deref() == Some(id)
    }
}

/// Moves to step `step` of `scenario`.
///
/// The active edge is `e{step+1}` and the active nodes are the scenario's
/// configured highlight set for that step.
pub fn apply_step(
    state: &SequencerState,
    scenario: &Scenario,
    step: usize,
) -> Result<SequencerState, CoreError> {
    let total = scenario.step_count();
    let (edge, spec) = match (scenario.edge_for_step(step), scenario.step(step)) {
        (Some(edge), Some(spec)) => (edge, spec),
        _ => return Err(CoreError::StepOutOfRange { step, total }),
    };

    let active_nodes: BTreeSet<String> = spec.highlight.iter().cloned().collect();

    let mut visited_nodes = state.visited_nodes.clone();
    visited_nodes.extend(active_nodes.iter().cloned());
    let mut visited_edges = state.visited_edges.clone();
    visited_edges.insert(edge.id.clone());

    Ok(SequencerState {
        scenario: Some(scenario.key),
        step: Some(step),
        active_nodes,
        active_edge: Some(edge.id.clone()),
        description: spec.description.clone(),
        visited_nodes,
        visited_edges,
    })
}

/// Returns to the unhighlighted base graph, keeping the scenario selected.
pub fn settle(state: &SequencerState) -> SequencerState {
    SequencerState::idle(state.scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn mint() -> std::sync::Arc<Scenario> {
        Catalog::builtin().get(ScenarioKey::Mint).unwrap()
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_idle_state() {
        let state = SequencerState::idle(Some(ScenarioKey::Mint));
        assert_eq!(state.step_index(), -1);
        assert!(state.is_idle());
        assert!(state.active_nodes.is_empty());
        assert!(state.active_edge.is_none());
        assert!(state.description.is_empty());
    }

    #[test]
    fn test_mint_steps() {
        let scenario = mint();
        let idle = SequencerState::idle(Some(ScenarioKey::Mint));

        let s0 = apply_step(&idle, &scenario, 0).unwrap();
        assert_eq!(s0.step_index(), 0);
        assert_eq!(s0.active_edge.as_deref(), Some("e1"));
        assert_eq!(s0.active_nodes, set(&["n1", "n2"]));

        let s1 = apply_step(&s0, &scenario, 1).unwrap();
        assert_eq!(s1.active_edge.as_deref(), Some("e2"));
        assert_eq!(s1.active_nodes, set(&["n3"]));
        assert!(!s1.is_node_active("n1"));

        let s2 = apply_step(&s1, &scenario, 2).unwrap();
        assert_eq!(s2.active_edge.as_deref(), Some("e3"));
        assert_eq!(s2.active_nodes, set(&["n4"]));
        assert!(s2.is_edge_active("e3"));
        assert!(!s2.description.is_empty());
    }

    #[test]
    fn test_visited_accumulates() {
        let scenario = mint();
        let mut state = SequencerState::idle(Some(ScenarioKey::Mint));
        for step in 0..scenario.step_count() {
            state = apply_step(&state, &scenario, step).unwrap();
        }

        assert_eq!(state.visited_nodes, set(&["n1", "n2", "n3", "n4"]));
        assert_eq!(state.visited_edges, set(&["e1", "e2", "e3"]));
    }

    #[test]
    fn test_apply_step_is_pure() {
        let scenario = mint();
        let idle = SequencerState::idle(Some(ScenarioKey::Mint));
        let before = idle.clone();

        let _ = apply_step(&idle, &scenario, 1).unwrap();
        assert_eq!(idle, before);
    }

    #[test]
    fn test_step_out_of_range() {
        let scenario = mint();
        let idle = SequencerState::idle(Some(ScenarioKey::Mint));

        let result = apply_step(&idle, &scenario, 3);
        assert!(matches!(
            result,
            Err(CoreError::StepOutOfRange { step: 3, total: 3 })
        ));
    }

    #[test]
    fn test_settle_keeps_selection() {
        let scenario = mint();
        let idle = SequencerState::idle(Some(ScenarioKey::Mint));
        let s0 = apply_step(&idle, &scenario, 0).unwrap();

        let settled = settle(&s0);
        assert_eq!(settled.scenario, Some(ScenarioKey::Mint));
        assert_eq!(settled.step_index(), -1);
        assert!(settled.visited_nodes.is_empty());
    }
}
