//! [`Backend`](super::handle::Backend) implementations.

#[cfg(any(test, feature = "mock_playback"))]
pub mod mock;
#[cfg(feature = "rodio")]
pub mod rodio;
