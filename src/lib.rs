//! sampleshelf: browse a folder of audio samples with cached waveform previews.
//!
//! The core is usable without the terminal UI: [`session::Session`] owns the
//! media database and the [`waveform::WaveformCache`].

pub mod app;
pub mod audio;
pub mod config;
pub mod library;
pub mod path;
pub mod remote;
pub mod runtime;
pub mod session;
pub mod ui;
pub mod waveform;
