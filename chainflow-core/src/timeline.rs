//! Playback timing and timeline planning.

use crate::scenario::Scenario;
use std::time::Duration;

/// What happens after the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Stay on the final highlighted step.
    Park,
    /// Return to the base graph after `delay`.
    Settle { delay: Duration },
}

/// Playback timing for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delay between selection and step 0.
    pub start_delay: Duration,
    /// Gap between consecutive steps.
    pub step_interval: Duration,
    pub terminal: Terminal,
}

impl Default for Timing {
    fn default() -> Self {
        Self::staggered()
    }
}

impl Timing {
    /// Quick walkthrough: 700ms steps, back to the base graph a second
    /// after the sequence ends.
    pub fn staggered() -> Self {
        Self {
            start_delay: Duration::from_millis(200),
            step_interval: Duration::from_millis(700),
            terminal: Terminal::Settle {
                delay: Duration::from_millis(1000),
            },
        }
    }

    /// Slow walkthrough that parks on the final step.
    pub fn fixed(step_interval: Duration) -> Self {
        Self {
            start_delay: Duration::ZERO,
            step_interval,
            terminal: Terminal::Park,
        }
    }

    pub fn with_start_delay(mut self, start_delay: Duration) -> Self {
        self.start_delay = start_delay;
        self
    }

    pub fn with_step_interval(mut self, step_interval: Duration) -> Self {
        self.step_interval = step_interval;
        self
    }

    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = terminal;
        self
    }
}

/// A scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Step(usize),
    Settle,
}

/// An action and its offset from the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub at: Duration,
    pub action: Action,
}

/// Ordered activations for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    pub activations: Vec<Activation>,
}

impl Timeline {
    /// Plans one activation per edge of `scenario`, plus a settle
    /// activation when the terminal policy asks for one.
    pub fn plan(scenario: &Scenario, timing: &Timing) -> Self {
        Self::for_steps(scenario.step_count(), timing)
    }

    /// Step `k` fires at `start_delay + k * step_interval`; a settle fires
    /// `delay` after the slot following the last step.
    pub fn for_steps(step_count: usize, timing: &Timing) -> Self {
        if step_count == 0 {
            return Self::default();
        }

        let mut activations: Vec<Activation> = (0..step_count)
            .map(|k| Activation {
                at: timing.start_delay + timing.step_interval * k as u32,
                action: Action::Step(k),
            })
            .collect();

        if let Terminal::Settle { delay } = timing.terminal {
            activations.push(Activation {
                at: timing.start_delay + timing.step_interval * step_count as u32 + delay,
                action: Action::Settle,
            });
        }

        Self { activations }
    }

    pub fn step_count(&self) -> usize {
        self.activations
            .iter()
            .filter(|a| matches!(a.action, Action::Step(_)))
            .count()
    }

    /// Offset of the last activation.
    pub fn duration(&self) -> Duration {
        self.activations.last().map_or(Duration::ZERO, |a| a.at)
    }

    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activation> {
        self.activations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::scenario::ScenarioKey;
    use proptest::prelude::*;

    #[test]
    fn test_staggered_plan() {
        let mint = Catalog::builtin().get(ScenarioKey::Mint).unwrap();
        let timeline = Timeline::plan(&mint, &Timing::staggered());

        let offsets: Vec<u64> = timeline
            .iter()
            .map(|a| a.at.as_millis() as u64)
            .collect();
        assert_eq!(offsets, vec![200, 900, 1600, 3300]);
        assert_eq!(timeline.step_count(), 3);
        assert_eq!(timeline.activations[3].action, Action::Settle);
        assert_eq!(timeline.duration(), Duration::from_millis(3300));
    }

    #[test]
    fn test_fixed_plan_parks() {
        let timeline = Timeline::for_steps(3, &Timing::fixed(Duration::from_millis(4000)));

        let actions: Vec<Action> = timeline.iter().map(|a| a.action).collect();
        assert_eq!(
            actions,
            vec![Action::Step(0), Action::Step(1), Action::Step(2)]
        );
        assert_eq!(timeline.duration(), Duration::from_millis(8000));
    }

    #[test]
    fn test_every_builtin_plans_one_step_per_edge() {
        let catalog = Catalog::builtin();
        for scenario in catalog.iter() {
            let timeline = Timeline::plan(scenario, &Timing::staggered());
            assert_eq!(timeline.step_count(), scenario.edges.len());
        }
    }

    #[test]
    fn test_empty_plan() {
        let timeline = Timeline::for_steps(0, &Timing::staggered());
        assert!(timeline.is_empty());
        assert_eq!(timeline.duration(), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn prop_steps_strictly_ordered(
            steps in 1usize..32,
            start in 0u64..1_000,
            interval in 1u64..10_000,
            settle in proptest::option::of(0u64..5_000),
        ) {
            let terminal = match settle {
                Some(ms) => Terminal::Settle { delay: Duration::from_millis(ms) },
                None => Terminal::Park,
            };
            let timing = Timing::fixed(Duration::from_millis(interval))
                .with_start_delay(Duration::from_millis(start))
                .with_terminal(terminal);
            let timeline = Timeline::for_steps(steps, &timing);

            prop_assert_eq!(timeline.step_count(), steps);
            for pair in timeline.activations.windows(2) {
                prop_assert!(pair[0].at < pair[1].at);
            }
            for (k, activation) in timeline.iter().take(steps).enumerate() {
                prop_assert_eq!(activation.action, Action::Step(k));
            }
        }
    }
}
