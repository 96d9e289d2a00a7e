//! Peak data types.
//!
//! A [`PeakSet`] is the downsampled waveform of one asset: one [`PeakFrame`]
//! per time bucket, each holding a min/max [`Peak`] per channel.

/// Minimum and maximum sample value inside one bucket of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub min: f32,
    pub max: f32,
}

impl Peak {
    pub const SILENT: Peak = Peak { min: 0.0, max: 0.0 };

    /// Largest absolute excursion in this bucket.
    pub fn magnitude(&self) -> f32 {
        self.min.abs().max(self.max.abs())
    }
}

/// One time bucket: a peak per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakFrame {
    pub channels: Vec<Peak>,
}

impl PeakFrame {
    pub fn new(channels: Vec<Peak>) -> Self {
        Self { channels }
    }

    /// Largest magnitude across channels.
    pub fn magnitude(&self) -> f32 {
        self.channels
            .iter()
            .map(Peak::magnitude)
            .fold(0.0, f32::max)
    }
}

/// The cached waveform of one asset.
///
/// Every frame carries the same number of channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakSet {
    frames: Vec<PeakFrame>,
}

impl PeakSet {
    /// Build a set from frames. Returns `None` when frames disagree on channel count.
    pub fn from_frames(frames: Vec<PeakFrame>) -> Option<Self> {
        let channels = frames.first().map(|f| f.channels.len()).unwrap_or(0);
        if frames.iter().any(|f| f.channels.len() != channels) {
            return None;
        }
        Some(Self { frames })
    }

    pub fn frames(&self) -> &[PeakFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn channels(&self) -> usize {
        self.frames.first().map(|f| f.channels.len()).unwrap_or(0)
    }

    /// Reduce to `width` magnitudes in `0.0..=1.0`-ish, for drawing.
    ///
    /// Each output column takes the loudest frame in its slice of the set.
    pub fn envelope(&self, width: usize) -> Vec<f32> {
        if width == 0 || self.frames.is_empty() {
            return Vec::new();
        }
        let n = self.frames.len();
        (0..width)
            .map(|col| {
                let start = col * n / width;
                let end = ((col + 1) * n / width).max(start + 1).min(n);
                self.frames[start..end]
                    .iter()
                    .map(PeakFrame::magnitude)
                    .fold(0.0, f32::max)
            })
            .collect()
    }
}
