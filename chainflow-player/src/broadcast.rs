//! Frame broadcasting to renderers.

use chainflow_core::{Frame, ScenarioKey};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Filter a renderer applies to received frames.
#[derive(Debug, Clone, Default)]
pub struct FrameFilter {
    /// Only frames for these scenarios (empty = all).
    pub scenarios: Vec<ScenarioKey>,
    /// Skip idle frames (resets, settles, cancels).
    pub steps_only: bool,
}

impl FrameFilter {
    /// Returns true if the frame matches this filter.
    pub fn matches(&self, frame: &Frame) -> bool {
        let scenario_ok = self.scenarios.is_empty()
            || frame
                .scenario
                .is_some_and(|key| self.scenarios.contains(&key));
        scenario_ok && !(self.steps_only && frame.is_idle())
    }
}

/// Subscription info.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub subscription_id: String,
    pub filter: FrameFilter,
}

/// Receiving end of a subscription. Frames that don't match the
/// subscription's filter are skipped.
pub struct FrameReceiver {
    subscription: Subscription,
    receiver: broadcast::Receiver<Frame>,
}

impl FrameReceiver {
    pub fn id(&self) -> &str {
        &self.subscription.subscription_id
    }

    pub fn filter(&self) -> &FrameFilter {
        &self.subscription.filter
    }

    /// Waits for the next matching frame.
    pub async fn recv(&mut self) -> Result<Frame, RecvError> {
        loop {
            let frame = self.receiver.recv().await?;
            if self.subscription.filter.matches(&frame) {
                return Ok(frame);
            }
        }
    }

    /// Returns the next matching frame that is already queued.
    pub fn try_recv(&mut self) -> Result<Frame, TryRecvError> {
        loop {
            let frame = self.receiver.try_recv()?;
            if self.subscription.filter.matches(&frame) {
                return Ok(frame);
            }
        }
    }
}

/// Fans frames out to every subscribed renderer.
pub struct FrameBroadcaster {
    sender: broadcast::Sender<Frame>,
    subscriptions: DashMap<String, Subscription>,
}

impl FrameBroadcaster {
    /// Creates a broadcaster with the given per-subscriber capacity.
    pub fn new(channel_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            sender,
            subscriptions: DashMap::new(),
        }
    }

    /// Subscribes to frames matching `filter`.
    pub fn subscribe(&self, filter: FrameFilter) -> FrameReceiver {
        let subscription = Subscription {
            subscription_id: format!("sub-{}", uuid::Uuid::new_v4()),
            filter,
        };
        let receiver = self.sender.subscribe();

        self.subscriptions
            .insert(subscription.subscription_id.clone(), subscription.clone());
        tracing::debug!(
            "Renderer subscribed: {} ({} active)",
            subscription.subscription_id,
            self.subscriptions.len()
        );

        FrameReceiver {
            subscription,
            receiver,
        }
    }

    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, subscription_id: &str) -> bool {
        self.subscriptions.remove(subscription_id).is_some()
    }

    /// Publishes a frame to every receiver.
    pub fn publish(&self, frame: Frame) {
        // No receivers is fine
        let _ = self.sender.send(frame);
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for FrameBroadcaster {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainflow_core::{apply_step, Catalog, SequencerState};

    fn frames_for(key: ScenarioKey) -> (Frame, Frame) {
        let scenario = Catalog::builtin().get(key).unwrap();
        let idle = SequencerState::idle(Some(key));
        let step = apply_step(&idle, &scenario, 0).unwrap();
        (
            Frame::project(Some(&*scenario), &idle),
            Frame::project(Some(&*scenario), &step),
        )
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let broadcaster = FrameBroadcaster::new(8);
        let rx = broadcaster.subscribe(FrameFilter::default());

        assert!(rx.id().starts_with("sub-"));
        assert_eq!(broadcaster.subscription_count(), 1);
        assert_eq!(broadcaster.receiver_count(), 1);

        assert!(broadcaster.unsubscribe(rx.id()));
        assert!(!broadcaster.unsubscribe(rx.id()));
        assert_eq!(broadcaster.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_publish() {
        let broadcaster = FrameBroadcaster::new(8);
        let mut rx = broadcaster.subscribe(FrameFilter::default());
        let (idle, step) = frames_for(ScenarioKey::Mint);

        broadcaster.publish(idle);
        broadcaster.publish(step);

        assert_eq!(rx.recv().await.unwrap().step, -1);
        assert_eq!(rx.recv().await.unwrap().step, 0);
    }

    #[test]
    fn test_publish_without_receivers() {
        let broadcaster = FrameBroadcaster::default();
        let (idle, _) = frames_for(ScenarioKey::Mint);
        broadcaster.publish(idle);
        assert_eq!(broadcaster.receiver_count(), 0);
    }

    #[test]
    fn test_filter_matches() {
        let (idle, step) = frames_for(ScenarioKey::Mint);

        assert!(FrameFilter::default().matches(&idle));

        let steps_only = FrameFilter {
            steps_only: true,
            ..Default::default()
        };
        assert!(!steps_only.matches(&idle));
        assert!(steps_only.matches(&step));

        let garage_only = FrameFilter {
            scenarios: vec![ScenarioKey::Garage],
            ..Default::default()
        };
        assert!(!garage_only.matches(&step));
        assert!(!garage_only.matches(&Frame::empty(None)));
    }

    #[tokio::test]
    async fn test_steps_only_receiver_skips_idle_frames() {
        let broadcaster = FrameBroadcaster::new(8);
        let mut rx = broadcaster.subscribe(FrameFilter {
            steps_only: true,
            ..Default::default()
        });
        let (idle, step) = frames_for(ScenarioKey::Mint);

        broadcaster.publish(idle.clone());
        broadcaster.publish(step);
        broadcaster.publish(idle);

        let frame = rx.recv().await.unwrap();
        assert!(!frame.is_idle());
        assert_eq!(frame.step, 0);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_scenario_receiver_skips_other_scenarios() {
        let broadcaster = FrameBroadcaster::new(8);
        let mut rx = broadcaster.subscribe(FrameFilter {
            scenarios: vec![ScenarioKey::Garage],
            ..Default::default()
        });
        let (_, mint_step) = frames_for(ScenarioKey::Mint);
        let (_, garage_step) = frames_for(ScenarioKey::Garage);

        broadcaster.publish(mint_step);
        broadcaster.publish(garage_step);

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.scenario, Some(ScenarioKey::Garage));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
