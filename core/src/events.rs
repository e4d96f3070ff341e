//! Change notifications for render surfaces.
//!
//! Observers subscribe once and then receive a [`StateUpdate`] after every mutation of the
//! kernel's state, in mutation order. Live playback progress is not sent here; it is published
//! separately through [`AudioKernel::progress`](crate::audio::AudioKernel::progress).

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::state::{PlaybackStatus, StateAudio};

/// What a single mutation changed.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum StateChange {
    /// A different track became current.
    TrackChanged,
    /// The queue was replaced.
    QueueChanged,
    StatusChanged(PlaybackStatus),
    VolumeChanged(f32),
    Muted,
    Unmuted,
    /// The playhead was moved to the given position, in seconds.
    Seeked(f64),
    VisibilityChanged(bool),
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrackChanged => write!(f, "Track Changed"),
            Self::QueueChanged => write!(f, "Queue Changed"),
            Self::StatusChanged(status) => write!(f, "Status Changed to {status}"),
            Self::VolumeChanged(volume) => write!(f, "Volume Changed to {:.0}%", volume * 100.0),
            Self::Muted => write!(f, "Muted"),
            Self::Unmuted => write!(f, "Unmuted"),
            Self::Seeked(position) => write!(f, "Seeked to {position:.2}s"),
            Self::VisibilityChanged(true) => write!(f, "Shown"),
            Self::VisibilityChanged(false) => write!(f, "Hidden"),
        }
    }
}

/// A notification: what changed, and the full state after the change.
///
/// The first update a subscriber receives carries no changes, only the state at the time it
/// subscribed.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StateUpdate {
    pub changes: Vec<StateChange>,
    pub state: StateAudio,
}

/// Fans state updates out to any number of subscribers.
///
/// Subscribers that dropped their receiver are forgotten on the next publish.
#[derive(Debug, Default)]
pub struct Broadcaster {
    subscribers: Vec<UnboundedSender<StateUpdate>>,
}

impl Broadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber, primed with `current`.
    pub fn subscribe(&mut self, current: StateAudio) -> UnboundedReceiver<StateUpdate> {
        let (tx, rx) = unbounded_channel();
        // the receiver is alive, so this cannot fail
        let _ = tx.send(StateUpdate {
            changes: Vec::new(),
            state: current,
        });
        self.subscribers.push(tx);
        rx
    }

    /// Send `changes` and `state` to every live subscriber.
    ///
    /// Returns how many subscribers were notified.
    pub fn publish(&mut self, changes: Vec<StateChange>, state: StateAudio) -> usize {
        let update = StateUpdate { changes, state };
        self.subscribers
            .retain(|subscriber| subscriber.send(update.clone()).is_ok());
        if self.subscribers.is_empty() {
            debug!("no subscribers for {:?}", update.changes);
        }
        self.subscribers.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_subscribe_sends_the_current_state() {
        let mut broadcaster = Broadcaster::new();
        let mut state = StateAudio::default();
        state.session.is_visible = true;

        let mut rx = broadcaster.subscribe(state.clone());

        assert_eq!(
            rx.try_recv().ok(),
            Some(StateUpdate {
                changes: vec![],
                state
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_reaches_every_subscriber_in_order() {
        let mut broadcaster = Broadcaster::new();
        let mut first = broadcaster.subscribe(StateAudio::default());
        let mut second = broadcaster.subscribe(StateAudio::default());

        broadcaster.publish(vec![StateChange::Muted], StateAudio::default());
        broadcaster.publish(vec![StateChange::Unmuted], StateAudio::default());

        for rx in [&mut first, &mut second] {
            let changes: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
                .map(|update| update.changes)
                .collect();
            assert_eq!(
                changes,
                vec![vec![], vec![StateChange::Muted], vec![StateChange::Unmuted]]
            );
        }
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut broadcaster = Broadcaster::new();
        let kept = broadcaster.subscribe(StateAudio::default());
        let dropped = broadcaster.subscribe(StateAudio::default());
        drop(dropped);

        assert_eq!(broadcaster.subscriber_count(), 2);
        assert_eq!(
            broadcaster.publish(vec![StateChange::TrackChanged], StateAudio::default()),
            1
        );
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(kept);
    }

    #[rstest]
    #[case(StateChange::TrackChanged, "Track Changed")]
    #[case(StateChange::StatusChanged(PlaybackStatus::Playing), "Status Changed to Playing")]
    #[case(StateChange::VolumeChanged(0.3), "Volume Changed to 30%")]
    #[case(StateChange::Seeked(12.5), "Seeked to 12.50s")]
    #[case(StateChange::VisibilityChanged(false), "Hidden")]
    fn test_state_change_display(#[case] change: StateChange, #[case] expected: &str) {
        assert_eq!(change.to_string(), expected);
    }
}
