//! A scripted in-memory backend.
//!
//! Nothing is decoded and nothing is played. Handles answer transport calls by reporting the
//! lifecycle events a real player would, and every call is recorded so tests can check the
//! order in which handles were created, driven and destroyed.
//! The [`MockController`] stands in for the media itself: it finishes tracks, moves the
//! playhead, fails urls and toggles the autoplay policy.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use crate::{
    audio::handle::{Backend, HandleEvent, HandleEvents, HandleId, LoadRequest, PlaybackHandle},
    format::FormatHint,
};

/// A call made against the mock backend or one of its handles.
#[derive(Clone, Debug, PartialEq)]
pub enum MockCall {
    Created {
        id: HandleId,
        url: String,
        format: Option<FormatHint>,
    },
    Play(HandleId),
    Pause(HandleId),
    Seek(HandleId, f64),
    Volume(HandleId, f32),
    Muted(HandleId, bool),
    Destroyed(HandleId),
}

#[derive(Debug, Default)]
struct Media {
    position: f64,
    duration: Option<f64>,
    failed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    calls: Vec<MockCall>,
    live: Vec<HandleId>,
    max_live: usize,
    media: HashMap<HandleId, Media>,
    reporters: HashMap<HandleId, HandleEvents>,
    autoplay_blocked: bool,
    failing_urls: HashSet<String>,
    /// duration reported by handles created from now on
    duration: Option<f64>,
}

/// The backend half, handed to the kernel.
#[derive(Debug)]
pub struct MockBackend {
    shared: Rc<RefCell<Shared>>,
}

/// The test half, used to inspect and script the backend.
#[derive(Clone, Debug)]
pub struct MockController {
    shared: Rc<RefCell<Shared>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> (Self, MockController) {
        let shared = Rc::new(RefCell::new(Shared {
            duration: Some(180.0),
            ..Default::default()
        }));
        (
            Self {
                shared: shared.clone(),
            },
            MockController { shared },
        )
    }
}

impl Backend for MockBackend {
    fn create(&mut self, request: LoadRequest, events: HandleEvents) -> Box<dyn PlaybackHandle> {
        let id = events.id();
        let mut shared = self.shared.borrow_mut();
        let failed = shared.failing_urls.contains(&request.url);

        shared.calls.push(MockCall::Created {
            id,
            url: request.url,
            format: request.format,
        });
        shared.live.push(id);
        shared.max_live = shared.max_live.max(shared.live.len());
        let duration = if failed { None } else { shared.duration };
        shared.media.insert(
            id,
            Media {
                position: 0.0,
                duration,
                failed,
            },
        );
        shared.reporters.insert(id, events.clone());
        drop(shared);

        if failed {
            events.emit(HandleEvent::LoadError("404 Not Found".into()));
        }

        Box::new(MockHandle {
            id,
            events,
            shared: self.shared.clone(),
            destroyed: false,
        })
    }
}

struct MockHandle {
    id: HandleId,
    events: HandleEvents,
    shared: Rc<RefCell<Shared>>,
    destroyed: bool,
}

impl MockHandle {
    fn record(&self, call: MockCall) {
        self.shared.borrow_mut().calls.push(call);
    }

    fn failed(&self) -> bool {
        self.shared
            .borrow()
            .media
            .get(&self.id)
            .is_some_and(|media| media.failed)
    }
}

impl PlaybackHandle for MockHandle {
    fn play(&mut self) {
        self.record(MockCall::Play(self.id));
        if self.destroyed || self.failed() {
            return;
        }
        if self.shared.borrow().autoplay_blocked {
            self.events
                .emit(HandleEvent::PlayError("NotAllowedError".into()));
        } else {
            self.events.emit(HandleEvent::Started);
        }
    }

    fn pause(&mut self) {
        self.record(MockCall::Pause(self.id));
        if !self.destroyed {
            self.events.emit(HandleEvent::Paused);
        }
    }

    fn seek(&mut self, position: f64) {
        self.record(MockCall::Seek(self.id, position));
        if let Some(media) = self.shared.borrow_mut().media.get_mut(&self.id) {
            media.position = position;
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(MockCall::Volume(self.id, volume));
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(MockCall::Muted(self.id, muted));
    }

    fn position(&self) -> Option<f64> {
        self.shared
            .borrow()
            .media
            .get(&self.id)
            .map(|media| media.position)
    }

    fn duration(&self) -> Option<f64> {
        self.shared
            .borrow()
            .media
            .get(&self.id)
            .and_then(|media| media.duration)
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        let mut shared = self.shared.borrow_mut();
        shared.calls.push(MockCall::Destroyed(self.id));
        shared.live.retain(|id| *id != self.id);
    }
}

impl MockController {
    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.shared.borrow().calls.clone()
    }

    /// Handles created and not yet destroyed
    #[must_use]
    pub fn live_handles(&self) -> Vec<HandleId> {
        self.shared.borrow().live.clone()
    }

    /// The most handles that were ever live at once
    #[must_use]
    pub fn max_live(&self) -> usize {
        self.shared.borrow().max_live
    }

    #[must_use]
    pub fn created_urls(&self) -> Vec<String> {
        self.shared
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Created { url, .. } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn created_formats(&self) -> Vec<Option<FormatHint>> {
        self.shared
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Created { format, .. } => Some(*format),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn play_count(&self, id: HandleId) -> usize {
        self.shared
            .borrow()
            .calls
            .iter()
            .filter(|call| **call == MockCall::Play(id))
            .count()
    }

    /// The last volume and mute state applied to `id`
    #[must_use]
    pub fn applied_volume(&self, id: HandleId) -> Option<(f32, bool)> {
        let shared = self.shared.borrow();
        let volume = shared.calls.iter().rev().find_map(|call| match call {
            MockCall::Volume(handle, volume) if *handle == id => Some(*volume),
            _ => None,
        })?;
        let muted = shared.calls.iter().rev().find_map(|call| match call {
            MockCall::Muted(handle, muted) if *handle == id => Some(*muted),
            _ => None,
        })?;
        Some((volume, muted))
    }

    /// Refuse (or allow) every `play()` from now on.
    pub fn set_autoplay_blocked(&self, blocked: bool) {
        self.shared.borrow_mut().autoplay_blocked = blocked;
    }

    /// Make handles created for `url` fail to load.
    pub fn fail_url(&self, url: impl Into<String>) {
        self.shared.borrow_mut().failing_urls.insert(url.into());
    }

    /// Duration reported by handles created from now on.
    pub fn set_duration(&self, duration: Option<f64>) {
        self.shared.borrow_mut().duration = duration;
    }

    /// Change the duration `id` reports, e.g. once its metadata "loads".
    pub fn set_handle_duration(&self, id: HandleId, duration: Option<f64>) {
        if let Some(media) = self.shared.borrow_mut().media.get_mut(&id) {
            media.duration = duration;
        }
    }

    /// Move the playhead of `id`, as if it had been playing.
    pub fn set_position(&self, id: HandleId, position: f64) {
        if let Some(media) = self.shared.borrow_mut().media.get_mut(&id) {
            media.position = position;
        }
    }

    /// Report `event` as coming from `id`, whether or not that handle is still live.
    pub fn emit(&self, id: HandleId, event: HandleEvent) {
        let reporter = self.shared.borrow().reporters.get(&id).cloned();
        if let Some(reporter) = reporter {
            reporter.emit(event);
        }
    }

    /// Play `id` through to its end.
    pub fn finish(&self, id: HandleId) {
        {
            let mut shared = self.shared.borrow_mut();
            if let Some(media) = shared.media.get_mut(&id) {
                media.position = media.duration.unwrap_or_default();
            }
        }
        self.emit(id, HandleEvent::Ended);
    }
}
