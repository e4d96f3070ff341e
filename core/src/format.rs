//! Infers a container/codec hint from a media url.
//!
//! Urls served by the site frequently carry signed query strings or fragments, which defeats
//! decoders that sniff the extension of the raw string. The hint is resolved from the path
//! component only, and an unresolved hint is not an error.

use std::fmt;

/// Container/codec hint handed to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatHint {
    Mp3,
    Aac,
    M4a,
    Flac,
    Wav,
    Ogg,
    Opus,
    Webm,
}

impl FormatHint {
    /// Resolve a hint from an extension (case-insensitive, leading dot allowed)
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "mp3" | "mpga" => Some(Self::Mp3),
            "aac" => Some(Self::Aac),
            "m4a" | "mp4" => Some(Self::M4a),
            "flac" => Some(Self::Flac),
            "wav" | "wave" => Some(Self::Wav),
            "ogg" | "oga" => Some(Self::Ogg),
            "opus" => Some(Self::Opus),
            "webm" | "weba" => Some(Self::Webm),
            _ => None,
        }
    }

    /// Resolve a hint from a url or plain path.
    ///
    /// Query strings and fragments are ignored, and only the last path segment is inspected.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let path = path
            .split_once("://")
            .map_or(path, |(_, rest)| rest.split_once('/').map_or("", |(_, p)| p));
        let segment = path.rsplit('/').next().unwrap_or_default();
        let (stem, ext) = segment.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::from_extension(ext)
    }

    /// The canonical extension, which is also what decoders take as their hint string
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::M4a => "m4a",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
            Self::Webm => "webm",
        }
    }
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}
