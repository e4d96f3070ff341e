//! Fixtures shared by the tests of this crate and its dependents.

use std::{cell::RefCell, rc::Rc, sync::Once};

use crate::{
    audio::{
        AudioKernel,
        backend::mock::{MockBackend, MockController},
    },
    errors::TelemetryError,
    logger::{init_logger, init_tracing},
    state::track::Track,
    telemetry::{PlayEvent, SessionId, TelemetryEmitter, TelemetrySink},
};

static INIT: Once = Once::new();

/// Install the logger and tracing subscriber, once per test binary.
pub fn init() {
    INIT.call_once(|| {
        init_logger(log::LevelFilter::Debug);
        if let Err(e) = tracing::subscriber::set_global_default(init_tracing()) {
            eprintln!("tracing subscriber already set: {e}");
        }
    });
}

pub const RELEASE_ID: &str = "release-1";

/// `n` playable tracks from the same release, titled `Track 0`, `Track 1`, ...
#[must_use]
pub fn tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| Track {
            duration: "3:00".into(),
            release_title: "Release".into(),
            cover_art_url: "https://cdn.example/cover.jpg".into(),
            track_id: Some(format!("track-{i}")),
            release_id: Some(RELEASE_ID.into()),
            ..Track::new(
                format!("Track {i}"),
                format!("https://cdn.example/track-{i}.mp3"),
            )
        })
        .collect()
}

/// A telemetry sink that remembers everything it was given.
#[derive(Clone, Debug, Default)]
pub struct RecordingTelemetry {
    events: Rc<RefCell<Vec<PlayEvent>>>,
}

impl RecordingTelemetry {
    #[must_use]
    pub fn events(&self) -> Vec<PlayEvent> {
        self.events.borrow().clone()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn play_started(&self, event: &PlayEvent) -> Result<(), TelemetryError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}

/// A telemetry sink whose collaborator is always down.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingTelemetry;

impl TelemetrySink for FailingTelemetry {
    fn play_started(&self, _: &PlayEvent) -> Result<(), TelemetryError> {
        Err(TelemetryError::Rejected("503 Service Unavailable".into()))
    }
}

/// A kernel on the mock backend, with its controller and recorded telemetry.
#[must_use]
pub fn mock_kernel() -> (AudioKernel<MockBackend>, MockController, RecordingTelemetry) {
    let (backend, mock) = MockBackend::new();
    let telemetry = RecordingTelemetry::default();
    let kernel = AudioKernel::new(
        backend,
        TelemetryEmitter::new(Box::new(telemetry.clone())).with_session_id(SessionId::from("test")),
    );
    (kernel, mock, telemetry)
}
