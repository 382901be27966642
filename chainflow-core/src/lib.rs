//! # chainflow-core
//!
//! Scenario model for chainflow.
//!
//! This crate provides:
//! - Scenario definitions (nodes, edges, per-step highlight sets) and validation
//! - The built-in scenario catalog and catalog documents (YAML/JSON)
//! - Pure step transitions over the sequencer state
//! - Frame projection for renderers
//! - Timeline planning for timed playback

pub mod catalog;
pub mod error;
pub mod frame;
pub mod scenario;
pub mod state;
pub mod timeline;

pub use catalog::Catalog;
pub use error::CoreError;
pub use frame::{EdgeStatus, EdgeView, Frame, NodeStatus, NodeView};
pub use scenario::{Edge, Node, Position, Scenario, ScenarioKey, StepSpec};
pub use state::{apply_step, settle, SequencerState};
pub use timeline::{Action, Activation, Terminal, Timeline, Timing};
