use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::state::track::Track;

/// The ordered list of tracks loaded for sequential playback, and a cursor into it.
///
/// Invariant: `current_index < tracks.len()` whenever the queue is non-empty.
/// Navigation is linear, there is no wrap-around.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Queue {
    tracks: Arc<[Track]>,
    current_index: usize,
}

impl Queue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue contents and cursor.
    ///
    /// Returns `false` (leaving the queue untouched) if `start_index` is not a valid index into
    /// `tracks`, which includes the empty case.
    pub fn replace(&mut self, tracks: impl Into<Arc<[Track]>>, start_index: usize) -> bool {
        let tracks = tracks.into();
        if start_index >= tracks.len() {
            return false;
        }
        self.tracks = tracks;
        self.current_index = start_index;
        true
    }

    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.current_index)
    }

    /// The index `offset` steps away from the cursor, if it is inside the queue
    #[must_use]
    pub fn offset_index(&self, offset: isize) -> Option<usize> {
        self.current_index
            .checked_add_signed(offset)
            .filter(|&index| index < self.tracks.len())
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.offset_index(1).is_some()
    }

    /// Move the cursor `offset` steps, returning the track it lands on.
    ///
    /// Leaves the cursor where it was and returns `None` if that would leave the queue.
    pub fn step(&mut self, offset: isize) -> Option<&Track> {
        let index = self.offset_index(offset)?;
        self.current_index = index;
        self.tracks.get(index)
    }

    /// Move the cursor to `index`, returning the track there.
    pub fn set_current_index(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.current_index = index;
        self.tracks.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// A shared handle on the queued tracks
    #[must_use]
    pub fn tracks(&self) -> Arc<[Track]> {
        self.tracks.clone()
    }
}
