//! Play-start telemetry.
//!
//! One [`PlayEvent`] is emitted per track activation: an initial play, a manual track change,
//! or an auto-advance. Delivery is fire-and-forget; a failing collaborator is logged and
//! otherwise ignored, it never affects playback.

use std::fmt;

use log::{info, warn};
use once_cell::{sync::Lazy, unsync::OnceCell};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{errors::TelemetryError, state::track::Track};

/// Opaque identifier of one listening session, created lazily and kept for the life of the
/// process.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

static SESSION_ID: Lazy<SessionId> = Lazy::new(SessionId::generate);

impl SessionId {
    /// A fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        let value: u128 = rand::thread_rng().r#gen();
        Self(format!("{value:032x}"))
    }

    /// The identifier of this process
    #[must_use]
    pub fn current() -> Self {
        SESSION_ID.clone()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The payload handed to the telemetry collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayEvent {
    /// the track's stable id, or its media url when it has none
    pub track_id: String,
    pub track_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
    pub session_id: SessionId,
}

impl PlayEvent {
    /// Build the event for `track`. `None` if the track has neither an id nor a media url.
    #[must_use]
    pub fn for_track(track: &Track, session_id: SessionId) -> Option<Self> {
        Some(Self {
            track_id: track.telemetry_id()?.to_owned(),
            track_name: track.title.clone(),
            release_id: track.release_id.clone().filter(|id| !id.is_empty()),
            release_name: Some(track.release_title.clone()).filter(|name| !name.is_empty()),
            session_id,
        })
    }
}

/// The telemetry collaborator.
pub trait TelemetrySink {
    /// Record that a track started.
    ///
    /// # Errors
    ///
    /// Fails if the event could not be handed off. Callers do not retry.
    fn play_started(&self, event: &PlayEvent) -> Result<(), TelemetryError>;
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn play_started(&self, _: &PlayEvent) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Writes every event to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn play_started(&self, event: &PlayEvent) -> Result<(), TelemetryError> {
        info!(
            "play started: {} ({}) release={} session={}",
            event.track_name,
            event.track_id,
            event.release_id.as_deref().unwrap_or("-"),
            event.session_id
        );
        Ok(())
    }
}

/// Hands events to an asynchronous uploader over a channel.
#[derive(Clone, Debug)]
pub struct ChannelTelemetry {
    tx: UnboundedSender<PlayEvent>,
}

impl ChannelTelemetry {
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<PlayEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelTelemetry {
    fn play_started(&self, event: &PlayEvent) -> Result<(), TelemetryError> {
        self.tx
            .send(event.clone())
            .map_err(|_| TelemetryError::Unavailable)
    }
}

/// Builds play events and hands them to a [`TelemetrySink`], swallowing failures.
pub struct TelemetryEmitter {
    sink: Box<dyn TelemetrySink>,
    enabled: bool,
    session_id: OnceCell<SessionId>,
}

impl fmt::Debug for TelemetryEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryEmitter")
            .field("enabled", &self.enabled)
            .field("session_id", &self.session_id.get())
            .finish_non_exhaustive()
    }
}

impl Default for TelemetryEmitter {
    fn default() -> Self {
        Self::new(Box::new(NoopTelemetry))
    }
}

impl TelemetryEmitter {
    #[must_use]
    pub fn new(sink: Box<dyn TelemetrySink>) -> Self {
        Self {
            sink,
            enabled: true,
            session_id: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Report events under `session_id` instead of the process-wide one.
    #[must_use]
    pub fn with_session_id(self, session_id: SessionId) -> Self {
        let _ = self.session_id.set(session_id);
        self
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.session_id.get_or_init(SessionId::current)
    }

    /// Emit the play-start event for `track`.
    ///
    /// Returns whether the sink accepted it.
    pub fn play_started(&self, track: &Track) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(event) = PlayEvent::for_track(track, self.session_id().clone()) else {
            warn!("not reporting \"{}\": it has no id and no url", track.title);
            return false;
        };
        match self.sink.play_started(&event) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to report play of {}: {e}", event.track_id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::test_utils::{FailingTelemetry, RecordingTelemetry};

    fn release_track() -> Track {
        Track {
            track_id: Some("trk-1".into()),
            release_id: Some("rel-9".into()),
            release_title: "Night Drive".into(),
            ..Track::new("Opening", "https://cdn.example/opening.mp3")
        }
    }

    #[test]
    fn test_session_id_is_stable() {
        assert_eq!(SessionId::current(), SessionId::current());
        assert_eq!(SessionId::current().as_str().len(), 32);
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_play_event_for_track() {
        let event = PlayEvent::for_track(&release_track(), "s-1".into());
        assert_eq!(
            event,
            Some(PlayEvent {
                track_id: "trk-1".into(),
                track_name: "Opening".into(),
                release_id: Some("rel-9".into()),
                release_name: Some("Night Drive".into()),
                session_id: "s-1".into(),
            })
        );
    }

    #[rstest]
    #[case::no_id(None)]
    #[case::empty_id(Some(""))]
    fn test_track_id_falls_back_to_url(#[case] track_id: Option<&str>) {
        let track = Track {
            track_id: track_id.map(Into::into),
            ..Track::new("T", "x.mp3")
        };
        let event = PlayEvent::for_track(&track, "s".into());
        assert_eq!(event.map(|e| e.track_id), Some("x.mp3".to_owned()));
    }

    #[test]
    fn test_play_event_wire_format() -> anyhow::Result<()> {
        let event = PlayEvent::for_track(&Track::new("T", "x.mp3"), "s-1".into())
            .ok_or_else(|| anyhow::anyhow!("no event"))?;
        assert_eq!(
            serde_json::to_value(&event)?,
            serde_json::json!({
                "trackId": "x.mp3",
                "trackName": "T",
                "sessionId": "s-1",
            })
        );
        Ok(())
    }

    #[test]
    fn test_emitter_delivers() {
        let sink = RecordingTelemetry::default();
        let emitter =
            TelemetryEmitter::new(Box::new(sink.clone())).with_session_id("fixed".into());

        assert!(emitter.play_started(&release_track()));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].session_id, SessionId::from("fixed"));
    }

    #[test]
    fn test_emitter_swallows_failures() {
        let emitter = TelemetryEmitter::new(Box::new(FailingTelemetry));
        assert!(!emitter.play_started(&release_track()));
    }

    #[test]
    fn test_disabled_emitter_sends_nothing() {
        let sink = RecordingTelemetry::default();
        let emitter = TelemetryEmitter::new(Box::new(sink.clone())).enabled(false);
        assert!(!emitter.play_started(&release_track()));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_channel_sink() {
        let (sink, mut rx) = ChannelTelemetry::new();
        let emitter = TelemetryEmitter::new(Box::new(sink));

        assert!(emitter.play_started(&release_track()));
        assert_eq!(rx.try_recv().map(|e| e.track_id).ok(), Some("trk-1".into()));

        drop(rx);
        assert!(!emitter.play_started(&release_track()));
    }
}
