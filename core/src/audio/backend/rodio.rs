//! A backend that plays local files through the default output device.
//!
//! Accepts plain paths and `file://` urls. Remote urls are reported as load errors, fetching is
//! left to whatever serves the files.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{error, warn};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::{
    audio::handle::{Backend, HandleEvent, HandleEvents, LoadRequest, PlaybackHandle},
    errors::BackendError,
    format::FormatHint,
    state::Volume,
};

pub struct RodioBackend {
    /// keeps the output device open
    stream: OutputStream,
}

impl RodioBackend {
    /// Open the default output device.
    ///
    /// # Errors
    ///
    /// Fails if no output device is available.
    pub fn try_default() -> Result<Self, BackendError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl Backend for RodioBackend {
    fn create(&mut self, request: LoadRequest, events: HandleEvents) -> Box<dyn PlaybackHandle> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();

        let loaded = local_path(&request.url).and_then(|path| {
            let (source, duration) = decode(&path, request.format)?;
            sink.append(source);
            Ok((path, duration))
        });

        let (sink, media) = match loaded {
            Ok((path, duration)) => (
                Some(sink),
                Some(Media {
                    path,
                    format: request.format,
                    duration,
                }),
            ),
            Err(e) => {
                error!("Failed to load {}: {e}", request.url);
                events.emit(HandleEvent::LoadError(e.to_string()));
                sink.stop();
                (None, None)
            }
        };

        Box::new(RodioHandle {
            sink,
            media,
            events,
            volume: Volume::default(),
            playing: false,
            ended: false,
        })
    }
}

struct Media {
    path: PathBuf,
    format: Option<FormatHint>,
    duration: Option<Duration>,
}

struct RodioHandle {
    /// `None` when the track failed to load, or once destroyed
    sink: Option<Sink>,
    media: Option<Media>,
    events: HandleEvents,
    volume: Volume,
    playing: bool,
    /// the sink ran dry, replaying needs the file decoded again
    ended: bool,
}

impl RodioHandle {
    fn apply_gain(&self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(self.volume.effective());
        }
    }

    fn reload(&mut self) -> Result<(), BackendError> {
        let (Some(sink), Some(media)) = (self.sink.as_ref(), self.media.as_ref()) else {
            return Ok(());
        };
        let (source, _) = decode(&media.path, media.format)?;
        sink.append(source);
        self.ended = false;
        Ok(())
    }
}

impl PlaybackHandle for RodioHandle {
    fn play(&mut self) {
        if self.sink.is_none() {
            return;
        }
        if self.ended {
            if let Err(e) = self.reload() {
                self.events.emit(HandleEvent::LoadError(e.to_string()));
                return;
            }
        }
        if let Some(sink) = self.sink.as_ref() {
            sink.play();
        }
        self.playing = true;
        self.events.emit(HandleEvent::Started);
    }

    fn pause(&mut self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        sink.pause();
        self.playing = false;
        self.events.emit(HandleEvent::Paused);
    }

    fn seek(&mut self, position: f64) {
        // a drained sink has nothing to seek in, it restarts from zero on replay
        if self.ended {
            return;
        }
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if let Err(e) = sink.try_seek(Duration::from_secs_f64(position.max(0.0))) {
            warn!("Seek to {position:.2}s failed: {e}");
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume.set_level(volume);
        self.apply_gain();
    }

    fn set_muted(&mut self, muted: bool) {
        // sinks have no mute of their own
        self.volume.muted = muted;
        self.apply_gain();
    }

    fn position(&self) -> Option<f64> {
        if self.ended {
            return Some(0.0);
        }
        self.sink.as_ref().map(|sink| sink.get_pos().as_secs_f64())
    }

    fn duration(&self) -> Option<f64> {
        self.media
            .as_ref()
            .and_then(|media| media.duration)
            .map(|d| d.as_secs_f64())
    }

    fn poll(&mut self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if self.playing && !self.ended && sink.empty() {
            self.ended = true;
            self.playing = false;
            self.events.emit(HandleEvent::Ended);
        }
    }

    fn destroy(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.playing = false;
    }
}

fn decode(
    path: &Path,
    format: Option<FormatHint>,
) -> Result<(Decoder<BufReader<File>>, Option<Duration>), BackendError> {
    let file = File::open(path)?;
    let byte_len = file.metadata()?.len();

    let mut builder = Decoder::builder()
        .with_data(BufReader::new(file))
        .with_byte_len(byte_len)
        .with_seekable(true);
    if let Some(format) = format {
        builder = builder.with_hint(format.extension());
    }
    let source = builder.build()?;
    let duration = source.total_duration();
    Ok((source, duration))
}

fn local_path(url: &str) -> Result<PathBuf, BackendError> {
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if url.contains("://") {
        return Err(BackendError::UnsupportedUrl(url.to_owned()));
    }
    Ok(PathBuf::from(url))
}
