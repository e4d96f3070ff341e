//! The playback handle: the single live decoder/player resource bound to one track's url.
//!
//! Backends report lifecycle changes asynchronously, as [`HandleEvent`]s tagged with the
//! [`HandleId`] of the handle that produced them. The kernel compares that id against the live
//! handle before acting on an event, so a destroyed handle's in-flight callback can never touch
//! the state of its successor.

use std::fmt;

use log::debug;
use tokio::sync::mpsc::UnboundedSender;
use tracing::instrument;

use crate::{format::FormatHint, state::Volume};

/// Identity of one playback handle. Never reused within a kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// The closed set of lifecycle events a handle can report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandleEvent {
    /// Playback actually started (or resumed).
    Started,
    Paused,
    /// The track played through to its end.
    Ended,
    /// The resource could not be fetched or decoded.
    LoadError(String),
    /// `play()` was refused, typically by the host's autoplay policy.
    PlayError(String),
}

impl fmt::Display for HandleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "Started"),
            Self::Paused => write!(f, "Paused"),
            Self::Ended => write!(f, "Ended"),
            Self::LoadError(reason) => write!(f, "Load Error: {reason}"),
            Self::PlayError(reason) => write!(f, "Play Error: {reason}"),
        }
    }
}

/// What a backend needs to build a handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    /// Only present when the url's path names a known format; decoders are expected to fall
    /// back to content sniffing otherwise.
    pub format: Option<FormatHint>,
}

/// The reporting side of a handle's event stream.
#[derive(Clone, Debug)]
pub struct HandleEvents {
    id: HandleId,
    tx: UnboundedSender<(HandleId, HandleEvent)>,
}

impl HandleEvents {
    #[must_use]
    pub const fn new(id: HandleId, tx: UnboundedSender<(HandleId, HandleEvent)>) -> Self {
        Self { id, tx }
    }

    #[must_use]
    pub const fn id(&self) -> HandleId {
        self.id
    }

    /// Report an event. Silently dropped if the kernel is gone.
    pub fn emit(&self, event: HandleEvent) {
        if self.tx.send((self.id, event)).is_err() {
            debug!("{} reported an event after the kernel shut down", self.id);
        }
    }
}

/// One decodable resource bound to one url.
///
/// Transport calls must not block: their effects are reported back through the
/// [`HandleEvents`] the handle was created with.
pub trait PlaybackHandle {
    /// Start or resume playback.
    fn play(&mut self);
    fn pause(&mut self);
    /// Jump to `position` seconds.
    fn seek(&mut self, position: f64);
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    /// Current position in seconds, if the resource can report one
    fn position(&self) -> Option<f64>;
    /// Total duration in seconds, once known
    fn duration(&self) -> Option<f64>;
    /// Called once per frame while the handle is live, for backends that detect lifecycle
    /// changes by polling.
    fn poll(&mut self) {}
    /// Stop decoding and release the resource. No events may be reported afterwards.
    fn destroy(&mut self);
}

/// Builds playback handles.
pub trait Backend {
    fn create(&mut self, request: LoadRequest, events: HandleEvents) -> Box<dyn PlaybackHandle>;
}

/// Owns the single live playback handle.
pub struct HandleManager<B> {
    backend: B,
    current: Option<(HandleId, Box<dyn PlaybackHandle>)>,
    next_id: u64,
    events_tx: UnboundedSender<(HandleId, HandleEvent)>,
    /// handle whose `play()` was refused and should be retried once the host unlocks audio
    awaiting_unlock: Option<HandleId>,
}

impl<B: Backend> HandleManager<B> {
    #[must_use]
    pub const fn new(backend: B, events_tx: UnboundedSender<(HandleId, HandleEvent)>) -> Self {
        Self {
            backend,
            current: None,
            next_id: 0,
            events_tx,
            awaiting_unlock: None,
        }
    }

    /// Replace the live handle with a new one for `url`, and start it.
    ///
    /// The previous handle is destroyed before the new one is constructed, and `play()` is
    /// invoked before returning. Call this from the same turn as the user gesture that asked
    /// for playback; hosts with autoplay restrictions refuse a deferred `play()`.
    #[instrument(skip(self))]
    pub fn create_and_play(&mut self, url: &str, volume: Volume) -> HandleId {
        self.destroy();

        let id = HandleId(self.next_id);
        self.next_id += 1;

        let format = FormatHint::from_url(url);
        if format.is_none() {
            debug!("no format hint for {url}, leaving it to the decoder");
        }
        let request = LoadRequest {
            url: url.to_owned(),
            format,
        };
        let mut handle = self
            .backend
            .create(request, HandleEvents::new(id, self.events_tx.clone()));

        handle.set_volume(volume.level);
        handle.set_muted(volume.muted);
        handle.play();

        self.current = Some((id, handle));
        id
    }

    /// Destroy the live handle, if any. Returns whether there was one.
    #[instrument(skip(self))]
    pub fn destroy(&mut self) -> bool {
        self.awaiting_unlock = None;
        match self.current.take() {
            Some((id, mut handle)) => {
                handle.destroy();
                debug!("destroyed {id}");
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn current_id(&self) -> Option<HandleId> {
        self.current.as_ref().map(|(id, _)| *id)
    }

    /// Whether `id` names the live handle
    #[must_use]
    pub fn is_current(&self, id: HandleId) -> bool {
        self.current_id() == Some(id)
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.current.is_some()
    }

    /// An explicit `play()`. Supersedes any pending unlock retry.
    pub fn play(&mut self) {
        self.awaiting_unlock = None;
        if let Some((_, handle)) = self.current.as_mut() {
            handle.play();
        }
    }

    /// An explicit `pause()`. Supersedes any pending unlock retry.
    pub fn pause(&mut self) {
        self.awaiting_unlock = None;
        if let Some((_, handle)) = self.current.as_mut() {
            handle.pause();
        }
    }

    pub fn seek(&mut self, position: f64) {
        if let Some((_, handle)) = self.current.as_mut() {
            handle.seek(position);
        }
    }

    pub fn apply_volume(&mut self, volume: Volume) {
        if let Some((_, handle)) = self.current.as_mut() {
            handle.set_volume(volume.level);
            handle.set_muted(volume.muted);
        }
    }

    pub fn poll(&mut self) {
        if let Some((_, handle)) = self.current.as_mut() {
            handle.poll();
        }
    }

    /// The live handle, for read-only sampling
    #[must_use]
    pub fn handle(&self) -> Option<&dyn PlaybackHandle> {
        self.current.as_ref().map(|(_, handle)| handle.as_ref())
    }

    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        self.handle().and_then(|handle| handle.duration())
    }

    /// Remember that `id` had its `play()` refused.
    pub fn await_unlock(&mut self, id: HandleId) {
        if self.is_current(id) {
            self.awaiting_unlock = Some(id);
        }
    }

    /// Forget a pending retry, e.g. because the handle started after all.
    pub fn cancel_unlock(&mut self) {
        self.awaiting_unlock = None;
    }

    #[must_use]
    pub const fn is_awaiting_unlock(&self) -> bool {
        self.awaiting_unlock.is_some()
    }

    /// One-shot retry of a refused `play()`, now that the host allows playback.
    ///
    /// Returns whether a retry was issued.
    #[instrument(skip(self))]
    pub fn retry_after_unlock(&mut self) -> bool {
        let Some(id) = self.awaiting_unlock.take() else {
            return false;
        };
        match self.current.as_mut() {
            Some((current, handle)) if *current == id => {
                handle.play();
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}
