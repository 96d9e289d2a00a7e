//! Sample audition through the default output device.
//!
//! Only one sample plays at a time; starting another stops the previous one.

use std::fs::File;
use std::io::BufReader;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use thiserror::Error;
use tracing::debug;

use crate::path::AssetPath;

#[derive(Debug, Error)]
pub enum AuditionError {
    #[error("no audio output: {0}")]
    Output(#[from] rodio::StreamError),
    #[error("cannot open {path}: {source}")]
    Open {
        path: AssetPath,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: AssetPath,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}

pub struct Auditioner {
    stream: OutputStream,
    sink: Option<Sink>,
    volume: f32,
    playing: Option<AssetPath>,
}

impl Auditioner {
    pub fn new(volume: f32) -> Result<Self, AuditionError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped, which garbles the TUI.
        stream.log_on_drop(false);
        Ok(Self {
            stream,
            sink: None,
            volume: volume.clamp(0.0, 2.0),
            playing: None,
        })
    }

    /// Stop whatever is playing and start `asset` from the beginning.
    pub fn play(&mut self, asset: &AssetPath) -> Result<(), AuditionError> {
        self.stop();

        let file = File::open(asset.as_path()).map_err(|source| AuditionError::Open {
            path: asset.clone(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|source| AuditionError::Decode {
            path: asset.clone(),
            source,
        })?;

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);
        sink.play();

        debug!(asset = %asset, "audition started");
        self.sink = Some(sink);
        self.playing = Some(asset.clone());
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.playing = None;
    }

    /// The asset currently audible, if playback has not run out.
    pub fn playing(&self) -> Option<&AssetPath> {
        match &self.sink {
            Some(sink) if !sink.empty() => self.playing.as_ref(),
            _ => None,
        }
    }
}
