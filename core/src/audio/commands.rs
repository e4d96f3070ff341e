//! This module contains the commands that can be sent to the audio kernel.
#![allow(clippy::module_name_repetitions)]

use std::{fmt::Display, time::Duration};

use crate::{format_duration, state::track::Track};

/// Commands that can be sent to the audio kernel
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// replace the queue with a single track and play it
    PlaySingle(Box<Track>),
    /// replace the queue and play from `start_index`
    PlayQueue {
        tracks: Vec<Track>,
        start_index: usize,
    },
    Play,
    Pause,
    TogglePlayback,
    /// Queue Commands
    Queue(QueueCommand),
    /// seek to an absolute position in the current track
    Seek(Duration),
    /// volume control commands
    Volume(VolumeCommand),
    /// destroy the playback handle and hide the player, keeping the queue
    Close,
    /// the host now allows gesture-gated playback
    Unlocked,
}

impl PartialEq for AudioCommand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Play, Self::Play)
            | (Self::Pause, Self::Pause)
            | (Self::TogglePlayback, Self::TogglePlayback)
            | (Self::Close, Self::Close)
            | (Self::Unlocked, Self::Unlocked) => true,
            (Self::PlaySingle(a), Self::PlaySingle(b)) => a == b,
            (
                Self::PlayQueue {
                    tracks: a,
                    start_index: i,
                },
                Self::PlayQueue {
                    tracks: b,
                    start_index: j,
                },
            ) => a == b && i == j,
            (Self::Queue(a), Self::Queue(b)) => a == b,
            (Self::Seek(a), Self::Seek(b)) => a == b,
            (Self::Volume(a), Self::Volume(b)) => a == b,
            #[cfg(not(tarpaulin_include))]
            _ => false,
        }
    }
}

impl Display for AudioCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlaySingle(track) => write!(f, "Play \"{}\"", track.title),
            Self::PlayQueue {
                tracks,
                start_index,
            } => write!(
                f,
                "Play {:?} from {start_index}",
                tracks
                    .iter()
                    .map(|track| track.title.as_str())
                    .collect::<Vec<_>>()
            ),
            Self::Play => write!(f, "Play"),
            Self::Pause => write!(f, "Pause"),
            Self::TogglePlayback => write!(f, "Toggle Playback"),
            Self::Queue(command) => write!(f, "Queue: {command}"),
            Self::Seek(duration) => {
                write!(f, "Seek: to {} (HH:MM:SS)", format_duration(duration))
            }
            Self::Volume(command) => write!(f, "Volume: {command}"),
            Self::Close => write!(f, "Close"),
            Self::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// Queue Commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCommand {
    Next,
    Previous,
    SetPosition(usize),
}

impl Display for QueueCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Next => write!(f, "Next"),
            Self::Previous => write!(f, "Previous"),
            Self::SetPosition(n) => write!(f, "Set Position to {n}"),
        }
    }
}

/// Volume commands
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VolumeCommand {
    Up(f32),
    Down(f32),
    Set(f32),
    Mute,
    Unmute,
    ToggleMute,
}

impl Display for VolumeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up(percent) => write!(f, "+{percent:.0}%", percent = percent * 100.0),
            Self::Down(percent) => write!(f, "-{percent:.0}%", percent = percent * 100.0),
            Self::Set(percent) => write!(f, "={percent:.0}%", percent = percent * 100.0),
            Self::Mute => write!(f, "Mute"),
            Self::Unmute => write!(f, "Unmute"),
            Self::ToggleMute => write!(f, "Toggle Mute"),
        }
    }
}
