//! Waveform peaks: generation, the on-disk cache and the memoizing engine
//! that ties them together.

mod engine;
mod generator;
mod key;
mod model;
mod storage;

pub use engine::{PeakEvent, PeakStatus, WaveformCache, WaveformError};
pub use generator::{DecodeError, DecoderPeakGenerator, PeakBuilder, PeakGenerator, bucket_len};
pub use key::CacheKey;
pub use model::{Peak, PeakFrame, PeakSet};
pub use storage::{CacheStorage, FormatError, StorageError, format_peaks, parse_peaks};
