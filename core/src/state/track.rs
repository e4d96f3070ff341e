//! The track value type, and helpers for turning a release listing into a playable queue.

use serde::{Deserialize, Serialize};

/// A track as supplied by the release listing.
///
/// Immutable once queued. `duration` is a display label only; the authoritative duration
/// comes from the decoded resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    /// Media url, tracks without one are not playable.
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub release_title: String,
    #[serde(default)]
    pub cover_art_url: String,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub release_id: Option<String>,
}

impl Track {
    #[must_use]
    pub fn new(title: impl Into<String>, audio_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            audio_url: Some(audio_url.into()),
            ..Default::default()
        }
    }

    /// The media url, if it is usable
    #[must_use]
    pub fn playable_url(&self) -> Option<&str> {
        self.audio_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.playable_url().is_some()
    }

    /// The identifier reported to telemetry.
    ///
    /// Falls back to the media url when no stable id was supplied.
    #[must_use]
    pub fn telemetry_id(&self) -> Option<&str> {
        self.track_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.playable_url())
    }
}

/// Filter a listing down to its playable tracks.
#[must_use]
pub fn playable_tracks(listing: &[Track]) -> Vec<Track> {
    listing.iter().filter(|t| t.is_playable()).cloned().collect()
}

/// Filter a listing down to its playable tracks, and remap `start` (an index into `listing`)
/// onto the filtered list.
///
/// If the track at `start` is not playable, playback starts at the next playable track after
/// it. Returns `None` when nothing at or after `start` can be played.
#[must_use]
pub fn playable_queue(listing: &[Track], start: usize) -> Option<(Vec<Track>, usize)> {
    let start_index = listing
        .iter()
        .take(start)
        .filter(|t| t.is_playable())
        .count();
    let tracks = playable_tracks(listing);

    (start_index < tracks.len()).then_some((tracks, start_index))
}
