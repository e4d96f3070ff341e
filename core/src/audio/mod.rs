//! The audio kernel: the single owner of the queue, the session flags, the live playback handle
//! and the volume settings.
//!
//! Everything runs on the host's one thread. Views call the transition functions below (or
//! [`AudioKernel::dispatch`]), observe the results through [`AudioKernel::subscribe`] and
//! [`AudioKernel::progress`], and never hold on to the playback handle themselves.
//!
//! # Gesture-gated playback
//!
//! [`AudioKernel::play_single`], [`AudioKernel::play_queue`], [`AudioKernel::next`],
//! [`AudioKernel::previous`], [`AudioKernel::set_position`] and the transport calls reach the
//! handle's `play()` before they return. Call them directly from the input handler that asked
//! for playback and do not await anything first: hosts that gate audio on a trusted gesture
//! refuse a `play()` that arrives on a later turn.
//!
//! # Host hooks
//!
//! Handles report their lifecycle asynchronously. The host drains those reports with
//! [`AudioKernel::process_events`] (or [`AudioKernel::on_frame`], which also polls the handle and
//! samples progress) and forwards the audio-unlocked signal to [`AudioKernel::notify_unlocked`].
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod commands;
pub mod handle;
pub mod queue;
pub mod sampler;
pub mod seek;

use log::{debug, error, warn};
use tokio::sync::{
    mpsc::{UnboundedReceiver, unbounded_channel},
    watch,
};
use tracing::instrument;

use crate::{
    config::Settings,
    events::{Broadcaster, StateChange, StateUpdate},
    state::{PlaybackStatus, Progress, Session, StateAudio, Volume, track::Track},
    telemetry::{TelemetryEmitter, TelemetrySink},
};

use self::{
    commands::{AudioCommand, QueueCommand, VolumeCommand},
    handle::{Backend, HandleEvent, HandleId, HandleManager},
    queue::Queue,
    sampler::ProgressSampler,
    seek::{SeekController, SeekInput, SeekPhase, SeekSurface, time_at},
};

pub struct AudioKernel<B> {
    handles: HandleManager<B>,
    /// lifecycle reports from the handles, tagged with the handle that sent them
    events: UnboundedReceiver<(HandleId, HandleEvent)>,
    queue: Queue,
    is_playing: bool,
    is_visible: bool,
    status: PlaybackStatus,
    volume: Volume,
    seek: SeekController,
    sampler: ProgressSampler,
    progress: watch::Sender<Progress>,
    broadcaster: Broadcaster,
    telemetry: TelemetryEmitter,
}

impl<B: Backend> AudioKernel<B> {
    #[must_use]
    pub fn new(backend: B, telemetry: TelemetryEmitter) -> Self {
        let (events_tx, events) = unbounded_channel();
        let (progress, _) = watch::channel(Progress::default());

        Self {
            handles: HandleManager::new(backend, events_tx),
            events,
            queue: Queue::new(),
            is_playing: false,
            is_visible: false,
            status: PlaybackStatus::Idle,
            volume: Volume::default(),
            seek: SeekController::new(),
            sampler: ProgressSampler::new(),
            progress,
            broadcaster: Broadcaster::new(),
            telemetry,
        }
    }

    /// A kernel with the initial volume and telemetry switch taken from `settings`.
    #[must_use]
    pub fn with_settings(backend: B, settings: &Settings, sink: Box<dyn TelemetrySink>) -> Self {
        let telemetry = TelemetryEmitter::new(sink).enabled(settings.telemetry.enabled);
        let mut kernel = Self::new(backend, telemetry);
        kernel.volume = Volume::new(settings.player.volume, settings.player.muted);
        kernel
    }

    /// Apply a command. This is the entry point for every mutation a view can ask for.
    #[instrument(skip(self))]
    pub fn dispatch(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::PlaySingle(track) => self.play_single(*track),
            AudioCommand::PlayQueue {
                tracks,
                start_index,
            } => self.play_queue(tracks, start_index),
            AudioCommand::Play => self.play(),
            AudioCommand::Pause => self.pause(),
            AudioCommand::TogglePlayback => self.toggle_playback(),
            AudioCommand::Queue(command) => self.queue_control(command),
            AudioCommand::Seek(position) => self.seek_to(position.as_secs_f64()),
            AudioCommand::Volume(command) => self.volume_control(command),
            AudioCommand::Close => self.close(),
            AudioCommand::Unlocked => self.notify_unlocked(),
        }
    }

    #[instrument(skip(self))]
    fn queue_control(&mut self, command: QueueCommand) {
        match command {
            QueueCommand::Next => {
                self.next();
            }
            QueueCommand::Previous => {
                self.previous();
            }
            QueueCommand::SetPosition(index) => {
                self.set_position(index);
            }
        }
    }

    /// Replace the queue with `track` alone and play it.
    ///
    /// Must be called from the input handler that asked for playback.
    #[instrument(skip(self))]
    pub fn play_single(&mut self, track: Track) {
        if !track.is_playable() {
            warn!("\"{}\" has no audio url, not playing it", track.title);
            return;
        }
        self.load(vec![track], 0);
    }

    /// Replace the queue with `tracks` and play from `start_index`.
    ///
    /// `tracks` is expected to contain playable tracks only, see
    /// [`playable_queue`](crate::state::track::playable_queue). An empty list, an index outside
    /// it, or an unplayable start track leaves everything as it was.
    ///
    /// Must be called from the input handler that asked for playback.
    #[instrument(skip(self, tracks), fields(len = tracks.len()))]
    pub fn play_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        match tracks.get(start_index) {
            None => {
                warn!(
                    "Not playing: start index {start_index} is outside a queue of {}",
                    tracks.len()
                );
                return;
            }
            Some(track) if !track.is_playable() => {
                warn!("Not playing: \"{}\" has no audio url", track.title);
                return;
            }
            Some(_) => {}
        }
        self.load(tracks, start_index);
    }

    fn load(&mut self, tracks: Vec<Track>, start_index: usize) {
        if !self.queue.replace(tracks, start_index) {
            return;
        }
        let mut changes = vec![StateChange::QueueChanged];
        self.show(&mut changes);
        self.activate(changes);
    }

    /// Skip to the next track. Returns `false` (and does nothing) at the end of the queue.
    #[instrument(skip(self))]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        self.advance(1)
    }

    /// Go back one track. Returns `false` (and does nothing) at the start of the queue.
    #[instrument(skip(self))]
    pub fn previous(&mut self) -> bool {
        self.advance(-1)
    }

    /// Jump to the track at `index`.
    #[instrument(skip(self))]
    pub fn set_position(&mut self, index: usize) -> bool {
        if self.queue.set_current_index(index).is_none() {
            warn!(
                "Not jumping: {index} is outside a queue of {}",
                self.queue.len()
            );
            return false;
        }
        let mut changes = Vec::new();
        self.show(&mut changes);
        self.activate(changes);
        true
    }

    fn advance(&mut self, offset: isize) -> bool {
        if self.queue.step(offset).is_none() {
            debug!(
                "no track {offset:+} from {} in a queue of {}",
                self.queue.current_index(),
                self.queue.len()
            );
            return false;
        }
        let mut changes = Vec::new();
        self.show(&mut changes);
        self.activate(changes);
        true
    }

    /// Start the current track on a fresh handle.
    fn activate(&mut self, mut changes: Vec<StateChange>) {
        self.seek.cancel();
        self.sampler.stop();
        self.set_progress(Progress::default());
        changes.push(StateChange::TrackChanged);

        let Some(track) = self.queue.current_track().cloned() else {
            return;
        };

        if let Some(url) = track.playable_url() {
            self.handles.create_and_play(url, self.volume);
            self.is_playing = true;
            self.set_status(PlaybackStatus::Loading, &mut changes);
            self.telemetry.play_started(&track);
        } else {
            error!("\"{}\" has no audio url, stopping playback", track.title);
            self.handles.destroy();
            self.is_playing = false;
            self.set_status(PlaybackStatus::Idle, &mut changes);
        }

        self.publish(changes);
    }

    #[instrument(skip(self))]
    pub fn play(&mut self) {
        self.handles.play();
    }

    #[instrument(skip(self))]
    pub fn pause(&mut self) {
        self.handles.pause();
    }

    /// Pause if playing, resume otherwise.
    ///
    /// The playing flag itself only changes once the handle reports that it started or paused.
    #[instrument(skip(self))]
    pub fn toggle_playback(&mut self) {
        if !self.handles.is_live() {
            debug!("nothing to toggle");
            return;
        }
        if self.is_playing {
            self.handles.pause();
        } else {
            self.handles.play();
        }
    }

    /// Move the playhead to `position` seconds.
    ///
    /// The published progress moves at once, without waiting for the next sample.
    #[instrument(skip(self))]
    pub fn seek_to(&mut self, position: f64) {
        if !position.is_finite() {
            warn!("Ignoring seek to {position}");
            return;
        }
        if !self.handles.is_live() {
            debug!("nothing to seek");
            return;
        }

        let duration = self.known_duration();
        let position = match duration {
            Some(duration) => position.clamp(0.0, duration),
            None => position.max(0.0),
        };

        self.handles.seek(position);
        self.set_progress(Progress { position, duration });
        self.publish(vec![StateChange::Seeked(position)]);
    }

    /// Destroy the handle and hide the player. The queue and index are kept.
    #[instrument(skip(self))]
    pub fn close(&mut self) {
        self.seek.cancel();
        self.sampler.stop();
        self.handles.destroy();
        self.is_playing = false;
        self.set_progress(Progress::default());

        let mut changes = Vec::new();
        if self.is_visible {
            self.is_visible = false;
            changes.push(StateChange::VisibilityChanged(false));
        }
        self.set_status(PlaybackStatus::Idle, &mut changes);
        self.publish(changes);
    }

    #[instrument(skip(self))]
    #[allow(clippy::float_cmp)]
    pub fn volume_control(&mut self, command: VolumeCommand) {
        let before = self.volume;
        match command {
            VolumeCommand::Up(delta) => self.volume.set_level(self.volume.level + delta),
            VolumeCommand::Down(delta) => self.volume.set_level(self.volume.level - delta),
            VolumeCommand::Set(level) => self.volume.set_level(level),
            VolumeCommand::Mute => self.volume.muted = true,
            VolumeCommand::Unmute => self.volume.muted = false,
            VolumeCommand::ToggleMute => self.volume.muted = !self.volume.muted,
        }
        if self.volume == before {
            return;
        }

        self.handles.apply_volume(self.volume);

        let mut changes = Vec::new();
        if self.volume.level != before.level {
            changes.push(StateChange::VolumeChanged(self.volume.level));
        }
        if self.volume.muted != before.muted {
            changes.push(if self.volume.muted {
                StateChange::Muted
            } else {
                StateChange::Unmuted
            });
        }
        self.publish(changes);
    }

    /// A press on the seek bar. Starts a drag and shows the provisional position.
    ///
    /// While the duration is unknown there is no position to publish on [`Self::progress`];
    /// render the drag from the fraction in [`Self::seek_phase`] instead.
    #[instrument(skip(self))]
    pub fn seek_press(&mut self, surface: &SeekSurface, input: SeekInput) {
        if !self.handles.is_live() {
            return;
        }
        if let Some(fraction) = self.seek.press(surface, input) {
            self.show_provisional(fraction);
        }
    }

    /// A move during a drag. Never reaches the handle.
    pub fn seek_drag(&mut self, surface: &SeekSurface, input: SeekInput) {
        if let Some(fraction) = self.seek.drag(surface, input) {
            self.show_provisional(fraction);
        }
    }

    /// The end of a drag: commit its last position to the handle.
    ///
    /// Does not seek while the duration is unknown.
    #[instrument(skip(self))]
    pub fn seek_release(&mut self) {
        let Some(fraction) = self.seek.release() else {
            return;
        };
        match time_at(fraction, self.known_duration()) {
            Some(position) => self.seek_to(position),
            None => debug!("duration unknown, dropping the seek"),
        }
        self.seek.finish();
    }

    fn show_provisional(&mut self, fraction: f64) {
        let duration = self.known_duration();
        if let Some(position) = time_at(fraction, duration) {
            self.set_progress(Progress { position, duration });
        }
    }

    /// The host allows gesture-gated playback now: retry a refused `play()`, once.
    #[instrument(skip(self))]
    pub fn notify_unlocked(&mut self) {
        if self.handles.retry_after_unlock() {
            debug!("retried play after unlock");
        }
    }

    /// Run once per display frame.
    pub fn on_frame(&mut self) {
        self.handles.poll();
        self.process_events();
        self.sample_progress();
    }

    /// Apply every lifecycle report received so far. Returns how many were handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok((id, event)) = self.events.try_recv() {
            self.handle_event(id, event);
            handled += 1;
        }
        handled
    }

    /// Apply one lifecycle report. Reports from any handle but the live one are dropped.
    #[instrument(skip(self))]
    pub fn handle_event(&mut self, id: HandleId, event: HandleEvent) {
        if !self.handles.is_current(id) {
            debug!("ignoring {event} from superseded {id}");
            return;
        }

        let mut changes = Vec::new();
        match event {
            HandleEvent::Started => {
                self.handles.cancel_unlock();
                self.is_playing = true;
                self.sampler.start();
                self.set_status(PlaybackStatus::Playing, &mut changes);
            }
            HandleEvent::Paused => {
                self.is_playing = false;
                self.sampler.stop();
                self.set_status(PlaybackStatus::Paused, &mut changes);
            }
            HandleEvent::Ended => {
                self.sampler.stop();
                if self.seek.cancel() {
                    debug!("track ended during a seek drag, the drag is dropped");
                }
                if self.queue.has_next() {
                    self.advance(1);
                    return;
                }
                self.is_playing = false;
                self.handles.seek(0.0);
                let duration = self.known_duration();
                self.set_progress(Progress {
                    position: 0.0,
                    duration,
                });
                self.set_status(PlaybackStatus::Ended, &mut changes);
            }
            HandleEvent::LoadError(reason) => {
                error!(
                    "Failed to load track {} of {}: {reason}",
                    self.queue.current_index(),
                    self.queue.len()
                );
                self.is_playing = false;
                self.sampler.stop();
                self.set_status(PlaybackStatus::Idle, &mut changes);
            }
            HandleEvent::PlayError(reason) => {
                debug!("play() refused ({reason}), waiting for the host to unlock audio");
                self.handles.await_unlock(id);
                self.is_playing = false;
                self.sampler.stop();
                self.set_status(PlaybackStatus::Paused, &mut changes);
            }
        }
        self.publish(changes);
    }

    fn sample_progress(&mut self) {
        if !self.sampler.is_running() {
            return;
        }
        let Some(handle) = self.handles.handle() else {
            self.sampler.stop();
            return;
        };
        let next = self
            .sampler
            .sample(handle, self.current_progress(), self.seek.is_dragging());
        if let Some(next) = next {
            self.set_progress(next);
        }
    }

    fn show(&mut self, changes: &mut Vec<StateChange>) {
        if !self.is_visible {
            self.is_visible = true;
            changes.push(StateChange::VisibilityChanged(true));
        }
    }

    fn set_status(&mut self, status: PlaybackStatus, changes: &mut Vec<StateChange>) {
        if self.status != status {
            self.status = status;
            changes.push(StateChange::StatusChanged(status));
        }
    }

    fn set_progress(&self, progress: Progress) {
        self.progress.send_if_modified(|current| {
            if *current == progress {
                false
            } else {
                *current = progress;
                true
            }
        });
    }

    fn known_duration(&self) -> Option<f64> {
        self.current_progress()
            .duration
            .or_else(|| self.handles.duration())
            .filter(|d| d.is_finite() && *d >= 0.0)
    }

    fn publish(&mut self, changes: Vec<StateChange>) {
        if changes.is_empty() {
            return;
        }
        let state = self.state();
        self.broadcaster.publish(changes, state);
    }

    /// A snapshot of the session and volume
    #[must_use]
    pub fn state(&self) -> StateAudio {
        StateAudio {
            session: Session {
                tracks: self.queue.tracks(),
                current_index: self.queue.current_index(),
                is_playing: self.is_playing,
                is_visible: self.is_visible,
                status: self.status,
            },
            volume: self.volume,
        }
    }

    /// Observe state changes. The first update carries the current state.
    pub fn subscribe(&mut self) -> UnboundedReceiver<StateUpdate> {
        let state = self.state();
        self.broadcaster.subscribe(state)
    }

    /// Observe the live playback position.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    #[must_use]
    pub fn current_progress(&self) -> Progress {
        *self.progress.borrow()
    }

    #[must_use]
    pub const fn volume(&self) -> Volume {
        self.volume
    }

    #[must_use]
    pub const fn queue(&self) -> &Queue {
        &self.queue
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.is_visible
    }

    #[must_use]
    pub const fn status(&self) -> PlaybackStatus {
        self.status
    }

    #[must_use]
    pub const fn seek_phase(&self) -> SeekPhase {
        self.seek.phase()
    }

    /// The id of the live handle, if any
    #[must_use]
    pub fn handle_id(&self) -> Option<HandleId> {
        self.handles.current_id()
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        self.handles.backend()
    }
}
