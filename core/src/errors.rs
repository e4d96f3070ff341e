use thiserror::Error;

/// Errors that can occur with finding the config directory.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Unable to find the config directory for encore.")]
    Config,
}

/// Errors a playback backend can run into while opening or decoding a track.
///
/// These never escape the transition functions: the backend turns them into
/// [`crate::audio::handle::HandleEvent::LoadError`]s for the handle that hit them.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Unsupported media url: {0}")]
    UnsupportedUrl(String),
    #[error("Decoder error: {0}")]
    #[cfg(feature = "rodio")]
    Decoder(#[from] rodio::decoder::DecoderError),
    #[error("Output stream error: {0}")]
    #[cfg(feature = "rodio")]
    Stream(#[from] rodio::StreamError),
}

/// Errors reported by a telemetry collaborator.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Telemetry collaborator is unavailable.")]
    Unavailable,
    #[error("Telemetry event was rejected: {0}")]
    Rejected(String),
}
