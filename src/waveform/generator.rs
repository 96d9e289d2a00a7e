//! Peak generation: the decoder seam and the pure bucket builder.

use std::fs::File;
use std::io::{self, BufReader};

use rodio::{Decoder, Source};
use thiserror::Error;
use tracing::debug;

use crate::path::AssetPath;

use super::model::{Peak, PeakFrame, PeakSet};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: AssetPath,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode {path}: {reason}")]
    Unsupported { path: AssetPath, reason: String },
    #[error("{path} reports {channels} channels at {sample_rate} Hz")]
    InvalidFormat {
        path: AssetPath,
        channels: u16,
        sample_rate: u32,
    },
    #[error("{path} contains no audio")]
    NoAudio { path: AssetPath },
    #[error("{0}")]
    Other(String),
}

/// Produces peaks for an asset. Implementations may be slow and may fail;
/// they are called from background workers.
pub trait PeakGenerator: Send + Sync {
    /// `resolution` is the number of peak frames per second of audio.
    fn generate_peaks(&self, asset: &AssetPath, resolution: u32) -> Result<PeakSet, DecodeError>;
}

/// Samples per channel that make up one peak frame.
pub fn bucket_len(sample_rate: u32, resolution: u32) -> u64 {
    u64::from(sample_rate)
        .div_ceil(u64::from(resolution.max(1)))
        .max(1)
}

/// Folds interleaved samples into fixed-width min/max buckets.
///
/// The output depends only on the sample values, channel count, sample rate
/// and resolution: `ceil(samples_per_channel / bucket_len)` frames.
#[derive(Debug)]
pub struct PeakBuilder {
    bucket: u64,
    current: Vec<Option<Peak>>,
    cursor: usize,
    filled: u64,
    frames: Vec<PeakFrame>,
    samples: u64,
}

impl PeakBuilder {
    /// Returns `None` for zero channels.
    pub fn new(channels: usize, sample_rate: u32, resolution: u32) -> Option<Self> {
        if channels == 0 {
            return None;
        }
        Some(Self {
            bucket: bucket_len(sample_rate, resolution),
            current: vec![None; channels],
            cursor: 0,
            filled: 0,
            frames: Vec::new(),
            samples: 0,
        })
    }

    /// Feed the next interleaved sample.
    pub fn push(&mut self, sample: f32) {
        let s = if sample.is_finite() { sample } else { 0.0 };
        let slot = &mut self.current[self.cursor];
        *slot = Some(match *slot {
            Some(p) => Peak {
                min: p.min.min(s),
                max: p.max.max(s),
            },
            None => Peak { min: s, max: s },
        });
        self.samples += 1;

        self.cursor += 1;
        if self.cursor == self.current.len() {
            self.cursor = 0;
            self.filled += 1;
            if self.filled == self.bucket {
                self.flush();
            }
        }
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = f32>) {
        for s in samples {
            self.push(s);
        }
    }

    /// Total samples pushed, across channels.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn finish(mut self) -> PeakSet {
        if self.filled > 0 || self.cursor > 0 {
            self.flush();
        }
        PeakSet::from_frames(self.frames).unwrap_or_default()
    }

    fn flush(&mut self) {
        let channels = self
            .current
            .iter_mut()
            .map(|slot| slot.take().unwrap_or(Peak::SILENT))
            .collect();
        self.frames.push(PeakFrame::new(channels));
        self.filled = 0;
        self.cursor = 0;
    }
}

/// Decodes files with `rodio` and builds peaks from the decoded stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecoderPeakGenerator;

impl PeakGenerator for DecoderPeakGenerator {
    fn generate_peaks(&self, asset: &AssetPath, resolution: u32) -> Result<PeakSet, DecodeError> {
        let file = File::open(asset.as_path()).map_err(|source| DecodeError::Open {
            path: asset.clone(),
            source,
        })?;

        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| DecodeError::Unsupported {
                path: asset.clone(),
                reason: e.to_string(),
            })?;

        let channels = u16::from(decoder.channels());
        let sample_rate = u32::from(decoder.sample_rate());
        if sample_rate == 0 {
            return Err(DecodeError::InvalidFormat {
                path: asset.clone(),
                channels,
                sample_rate,
            });
        }
        let mut builder = PeakBuilder::new(usize::from(channels), sample_rate, resolution)
            .ok_or_else(|| DecodeError::InvalidFormat {
                path: asset.clone(),
                channels,
                sample_rate,
            })?;

        builder.extend(decoder);
        if builder.samples() == 0 {
            return Err(DecodeError::NoAudio {
                path: asset.clone(),
            });
        }

        let peaks = builder.finish();
        debug!(
            asset = %asset,
            frames = peaks.len(),
            channels,
            sample_rate,
            "generated peaks"
        );
        Ok(peaks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_len_rounds_up_and_never_hits_zero() {
        assert_eq!(bucket_len(44_100, 100), 441);
        assert_eq!(bucket_len(48_000, 7), 6_858);
        assert_eq!(bucket_len(8, 100), 1);
        assert_eq!(bucket_len(44_100, 0), 44_100);
    }

    #[test]
    fn builder_emits_ceil_frames_with_per_channel_extremes() {
        // 2 channels, bucket of 2 samples per channel, 5 stereo samples -> 3 frames.
        let mut b = PeakBuilder::new(2, 200, 100).unwrap();
        b.extend([
            0.1, -0.1, //
            0.5, -0.7, //
            -0.2, 0.3, //
            0.0, 0.9, //
            0.4, -0.4,
        ]);
        let peaks = b.finish();

        assert_eq!(peaks.len(), 3);
        assert_eq!(peaks.channels(), 2);
        assert_eq!(
            peaks.frames()[0].channels,
            vec![Peak { min: 0.1, max: 0.5 }, Peak { min: -0.7, max: -0.1 }]
        );
        assert_eq!(
            peaks.frames()[1].channels,
            vec![Peak { min: -0.2, max: 0.0 }, Peak { min: 0.3, max: 0.9 }]
        );
        assert_eq!(
            peaks.frames()[2].channels,
            vec![Peak { min: 0.4, max: 0.4 }, Peak { min: -0.4, max: -0.4 }]
        );
    }

    #[test]
    fn builder_fills_missing_channels_of_a_truncated_frame_with_silence() {
        let mut b = PeakBuilder::new(2, 100, 100).unwrap();
        b.extend([0.25, 0.5, -0.75]);
        let peaks = b.finish();
        assert_eq!(peaks.len(), 2);
        assert_eq!(
            peaks.frames()[1].channels,
            vec![Peak { min: -0.75, max: -0.75 }, Peak::SILENT]
        );
    }

    #[test]
    fn builder_is_deterministic_and_ignores_non_finite_input() {
        let samples: Vec<f32> = (0..10_000)
            .map(|i| ((i as f32) * 0.013).sin() * 0.8)
            .chain([f32::NAN, f32::INFINITY])
            .collect();

        let run = || {
            let mut b = PeakBuilder::new(1, 44_100, 100).unwrap();
            b.extend(samples.iter().copied());
            b.finish()
        };
        let a = run();
        assert_eq!(a, run());
        assert_eq!(a.len(), 10_002usize.div_ceil(441));
        assert!(a.frames().iter().all(|f| f.channels[0].min.is_finite()));
    }

    #[test]
    fn builder_rejects_zero_channels() {
        assert!(PeakBuilder::new(0, 44_100, 100).is_none());
    }

    #[test]
    fn decoder_generator_reports_missing_and_garbage_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = AssetPath::from_path(&dir.path().join("missing.wav"));
        assert!(matches!(
            DecoderPeakGenerator.generate_peaks(&missing, 100),
            Err(DecodeError::Open { .. })
        ));

        let garbage = dir.path().join("garbage.wav");
        std::fs::write(&garbage, b"definitely not RIFF").unwrap();
        assert!(
            DecoderPeakGenerator
                .generate_peaks(&AssetPath::from_path(&garbage), 100)
                .is_err()
        );
    }
}
