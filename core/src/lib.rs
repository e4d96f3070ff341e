//! The encore playback engine.
//!
//! A single owned [`audio::AudioKernel`] holds the queue, the session flags, the one live
//! playback handle and the volume settings. Views observe it through [`events`] and drive it
//! through the transition functions (or [`audio::commands::AudioCommand`]s); they never touch
//! the playback handle directly.

use std::time::Duration;

use errors::DirectoryError;

pub mod audio;
pub mod config;
pub mod errors;
pub mod events;
pub mod format;
pub mod logger;
pub mod state;
pub mod telemetry;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

/// Format a duration as `HH:MM:SS.ss`
#[must_use]
#[inline]
pub fn format_duration(duration: &Duration) -> String {
    let total_seconds = duration.as_secs_f64();
    let hours = (total_seconds / 3600.0).floor();
    let minutes = ((total_seconds - hours * 3600.0) / 60.0).floor();
    let seconds = total_seconds - hours * 3600.0 - minutes * 60.0;

    format!("{hours:02}:{minutes:02}:{seconds:05.2}")
}

/// Get the config directory for encore.
///
/// # Errors
///
/// Fails if the platform has no notion of a per-user config directory.
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, DirectoryError> {
    directories::ProjectDirs::from("", "", "encore")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(DirectoryError::Config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_str_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::from_secs(0), "00:00:00.00")]
    #[case(Duration::from_millis(10_500), "00:00:10.50")]
    #[case(Duration::from_secs(3600 + 120 + 1), "01:02:01.00")]
    fn test_format_duration(#[case] duration: Duration, #[case] expected: &str) {
        assert_str_eq!(format_duration(&duration), expected);
    }
}
