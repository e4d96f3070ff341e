//! Per-frame sampling of the live handle's playhead.

use crate::{audio::handle::PlaybackHandle, state::Progress};

/// Republishes the handle's position and duration on every frame while a track is playing.
///
/// Kept apart from the state broadcaster so that a moving playhead does not turn into a
/// session update per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressSampler {
    running: bool,
}

impl ProgressSampler {
    #[must_use]
    pub const fn new() -> Self {
        Self { running: false }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Returns whether the sampler was stopped before.
    pub fn start(&mut self) -> bool {
        !std::mem::replace(&mut self.running, true)
    }

    /// Returns whether the sampler was running before.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    /// Read the handle and compute the next progress value.
    ///
    /// Returns `None` when the sampler is stopped, when the handle reports a non-finite value,
    /// or when nothing changed. While `dragging`, only the duration is taken from the handle:
    /// the position belongs to the gesture.
    #[must_use]
    pub fn sample(
        &self,
        handle: &dyn PlaybackHandle,
        current: Progress,
        dragging: bool,
    ) -> Option<Progress> {
        if !self.running {
            return None;
        }
        let position = handle.position().filter(|p| p.is_finite())?;
        let duration = handle.duration().filter(|d| d.is_finite())?;

        let next = Progress {
            position: if dragging { current.position } else { position },
            duration: Some(duration),
        };
        (next != current).then_some(next)
    }
}
