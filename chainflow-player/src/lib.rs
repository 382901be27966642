//! # chainflow-player
//!
//! Timed playback for chainflow scenarios.
//!
//! This crate provides:
//! - The [`Sequencer`]: cancellable, timer-driven step playback
//! - Frame broadcasting to renderers
//! - Player configuration (YAML file plus environment overrides)

pub mod broadcast;
pub mod config;
pub mod error;
pub mod sequencer;

pub use broadcast::{FrameBroadcaster, FrameFilter, FrameReceiver, Subscription};
pub use config::{CatalogConfig, Config, ConfigError, PlayerConfig, TerminalPolicy, TimingConfig};
pub use error::PlayerError;
pub use sequencer::{RunInfo, Sequencer};
