//! Timer-driven step sequencer.
//!
//! Each run is driven by one tokio task that walks the timeline in order,
//! sleeping until each activation's deadline before firing it. Every run
//! gets a fresh generation; an activation only touches state while its
//! generation is still current, and the check happens under the state lock,
//! so nothing from a cancelled run is observable once `cancel` or `start`
//! returns.

use crate::broadcast::{FrameBroadcaster, FrameFilter, FrameReceiver};
use crate::config::Config;
use crate::error::PlayerError;
use chainflow_core::{
    apply_step, settle, Action, Catalog, Frame, Scenario, ScenarioKey, SequencerState, Timeline,
    Timing,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// What a call to `start` or `select` scheduled.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub generation: u64,
    pub scenario: Option<ScenarioKey>,
    pub timeline: Timeline,
}

struct Run {
    generation: u64,
    scenario: Option<Arc<Scenario>>,
    state: SequencerState,
    driver: Option<JoinHandle<()>>,
    /// Activations of the current generation that have not fired yet.
    remaining: usize,
}

impl Run {
    /// Retires the current generation and stops its driver.
    fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        self.remaining = 0;
        self.generation
    }

    fn frame(&self) -> Frame {
        Frame::project(self.scenario.as_deref(), &self.state)
    }
}

struct Shared {
    run: Mutex<Run>,
    broadcaster: Arc<FrameBroadcaster>,
}

impl Shared {
    /// Walks a run's timeline in order. Stops as soon as the run is retired.
    async fn drive(self: Arc<Self>, generation: u64, origin: Instant, timeline: Timeline) {
        for activation in timeline.iter() {
            tokio::time::sleep_until(origin + activation.at).await;
            if !self.fire(generation, activation.action) {
                return;
            }
        }
    }

    /// Applies one activation. Returns false if `generation` is stale.
    fn fire(&self, generation: u64, action: Action) -> bool {
        let mut run = self.run.lock();
        if run.generation != generation {
            tracing::debug!(
                "Suppressed stale activation {:?} (generation {}, current {})",
                action,
                generation,
                run.generation
            );
            return false;
        }
        run.remaining = run.remaining.saturating_sub(1);
        let Some(scenario) = run.scenario.clone() else {
            return true;
        };

        let next = match action {
            Action::Step(step) => match apply_step(&run.state, &scenario, step) {
                Ok(next) => {
                    tracing::debug!(
                        "{} step {}/{}: edge {:?}",
                        scenario.key,
                        step + 1,
                        scenario.step_count(),
                        next.active_edge
                    );
                    next
                }
                Err(e) => {
                    tracing::warn!("Skipping activation for {}: {}", scenario.key, e);
                    return true;
                }
            },
            Action::Settle => {
                tracing::debug!("{} settled back to base graph", scenario.key);
                settle(&run.state)
            }
        };

        run.state = next;
        self.broadcaster.publish(run.frame());
        true
    }
}

/// Plays scenarios from a catalog, one run at a time.
pub struct Sequencer {
    catalog: Arc<Catalog>,
    timing: Timing,
    shared: Arc<Shared>,
}

impl Sequencer {
    /// Creates an idle sequencer with nothing selected.
    pub fn new(catalog: Arc<Catalog>, timing: Timing, broadcaster: Arc<FrameBroadcaster>) -> Self {
        Self {
            catalog,
            timing,
            shared: Arc::new(Shared {
                run: Mutex::new(Run {
                    generation: 0,
                    scenario: None,
                    state: SequencerState::idle(None),
                    driver: None,
                    remaining: 0,
                }),
                broadcaster,
            }),
        }
    }

    /// Creates a sequencer from configuration, loading the configured catalog.
    pub fn from_config(config: &Config) -> Result<Self, PlayerError> {
        let catalog = config.catalog.load()?;
        Ok(Self::new(
            Arc::new(catalog),
            config.timing.to_timing(),
            Arc::new(FrameBroadcaster::new(config.player.channel_capacity)),
        ))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn broadcaster(&self) -> &Arc<FrameBroadcaster> {
        &self.shared.broadcaster
    }

    /// Selects a scenario by picker key using the default timing.
    ///
    /// Unknown keys clear the canvas and leave the sequencer idle.
    pub fn select(&self, key: &str) -> Result<RunInfo, PlayerError> {
        self.select_with(key, self.timing)
    }

    /// Selects a scenario by picker key with explicit timing.
    pub fn select_with(&self, key: &str, timing: Timing) -> Result<RunInfo, PlayerError> {
        match self.catalog.resolve(key) {
            Some(scenario) => self.start(scenario, timing),
            None => {
                tracing::warn!("Unknown scenario '{}', clearing canvas", key);
                let mut run = self.shared.run.lock();
                let generation = run.invalidate();
                run.scenario = None;
                run.state = SequencerState::idle(None);
                self.shared.broadcaster.publish(run.frame());
                Ok(RunInfo {
                    generation,
                    scenario: None,
                    timeline: Timeline::default(),
                })
            }
        }
    }

    /// Cancels any in-flight run, resets to step -1 and schedules `scenario`.
    ///
    /// A scenario without edges stays idle and schedules nothing.
    pub fn start(&self, scenario: Arc<Scenario>, timing: Timing) -> Result<RunInfo, PlayerError> {
        let handle = Handle::try_current().map_err(|_| PlayerError::NoRuntime)?;
        let timeline = Timeline::plan(&scenario, &timing);

        let mut run = self.shared.run.lock();
        let generation = run.invalidate();
        run.scenario = Some(scenario.clone());
        run.state = SequencerState::idle(Some(scenario.key));
        self.shared.broadcaster.publish(run.frame());

        if !timeline.is_empty() {
            let origin = Instant::now();
            run.remaining = timeline.activations.len();
            run.driver = Some(handle.spawn(Arc::clone(&self.shared).drive(
                generation,
                origin,
                timeline.clone(),
            )));
        }

        tracing::info!(
            "Playing {} ({} step(s), generation {})",
            scenario.key,
            timeline.step_count(),
            generation
        );

        Ok(RunInfo {
            generation,
            scenario: Some(scenario.key),
            timeline,
        })
    }

    /// Drops every pending activation and returns to step -1. Idempotent.
    pub fn cancel(&self) {
        let mut run = self.shared.run.lock();
        let was_running = run.remaining > 0 || !run.state.is_idle();
        run.invalidate();
        if was_running {
            run.state = settle(&run.state);
            self.shared.broadcaster.publish(run.frame());
            tracing::debug!("Cancelled run, generation now {}", run.generation);
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SequencerState {
        self.shared.run.lock().state.clone()
    }

    /// Current frame for renderers.
    pub fn frame(&self) -> Frame {
        self.shared.run.lock().frame()
    }

    pub fn scenario(&self) -> Option<Arc<Scenario>> {
        self.shared.run.lock().scenario.clone()
    }

    pub fn generation(&self) -> u64 {
        self.shared.run.lock().generation
    }

    /// Number of activations of the current run that have not fired yet.
    pub fn pending(&self) -> usize {
        self.shared.run.lock().remaining
    }

    /// Subscribes to frames matching `filter`.
    pub fn subscribe(&self, filter: FrameFilter) -> FrameReceiver {
        self.shared.broadcaster.subscribe(filter)
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.shared.run.lock().invalidate();
    }
}
