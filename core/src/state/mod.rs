//! Snapshots of the kernel's state, as seen by observers.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

pub mod track;

use track::Track;

/// Where the session is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum PlaybackStatus {
    /// Nothing loaded, or the player was closed.
    #[default]
    Idle,
    /// A handle was created and asked to play, but has not reported that it started.
    Loading,
    Playing,
    Paused,
    /// The last track of the queue finished, the handle is retained.
    Ended,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Loading => write!(f, "Loading"),
            Self::Playing => write!(f, "Playing"),
            Self::Paused => write!(f, "Paused"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

/// The session record.
///
/// A snapshot: the kernel keeps these fields itself, updates them in place during a
/// transition, and builds a fresh `Session` for [`StateAudio`] once the transition is done.
/// Observers only ever receive such snapshots. The track list is shared with the queue.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Session {
    pub tracks: Arc<[Track]>,
    pub current_index: usize,
    pub is_playing: bool,
    pub is_visible: bool,
    pub status: PlaybackStatus,
}

impl Session {
    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.current_index)
    }
}

/// Output volume, independent of the session.
///
/// Survives queue changes and is applied to every handle the kernel creates.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Volume {
    /// in `[0, 1]`
    pub level: f32,
    pub muted: bool,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            level: 1.0,
            muted: false,
        }
    }
}

impl Volume {
    #[must_use]
    pub fn new(level: f32, muted: bool) -> Self {
        Self {
            level: clamp_level(level),
            muted,
        }
    }

    pub fn set_level(&mut self, level: f32) {
        self.level = clamp_level(level);
    }

    /// The gain actually applied to the output
    #[must_use]
    pub fn effective(&self) -> f32 {
        if self.muted { 0.0 } else { self.level }
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        return 0.0;
    }
    level.clamp(0.0, 1.0)
}

/// Playback position of the live handle, in seconds.
///
/// `duration` is `None` until the handle has loaded enough of the resource to know it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Progress {
    pub position: f64,
    pub duration: Option<f64>,
}

impl Progress {
    /// Fraction of the track played, in `[0, 1]`
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        self.duration
            .filter(|d| *d > 0.0)
            .map(|d| (self.position / d).clamp(0.0, 1.0))
    }
}

/// Everything a render surface needs, besides the live progress.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct StateAudio {
    pub session: Session,
    pub volume: Volume,
}
