//! On-disk peak cache.
//!
//! Each entry is a text file named after its [`CacheKey`]: one line per peak
//! frame, whitespace-separated `min max` pairs per channel. Writers go
//! through a temporary file and `rename`, so readers see either the old
//! entry, the new one, or nothing.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

use super::key::CacheKey;
use super::model::{Peak, PeakFrame, PeakSet};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cache directory {path} is unavailable: {source}")]
    CacheUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write cache entry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("line {line}: field {field:?} is not a number")]
    NotANumber { line: usize, field: String },
    #[error("line {line}: expected an even number of fields, got {count}")]
    OddFieldCount { line: usize, count: usize },
    #[error("line {line}: {count} fields, earlier lines had {expected}")]
    ChannelMismatch {
        line: usize,
        count: usize,
        expected: usize,
    },
}

/// Peak files under a cache root, or nothing at all in degraded mode.
#[derive(Debug)]
pub struct CacheStorage {
    root: Option<PathBuf>,
    temp_counter: AtomicU64,
}

impl CacheStorage {
    /// Use `root` as the cache directory, creating it if needed.
    ///
    /// If the directory cannot be created the storage is disabled: every load
    /// misses and every store is dropped. This is logged once, here.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        match fs::create_dir_all(&root) {
            Ok(()) => {
                debug!(root = %root.display(), "peak cache ready");
                Self {
                    root: Some(root),
                    temp_counter: AtomicU64::new(0),
                }
            }
            Err(source) => {
                let err = StorageError::CacheUnavailable { path: root, source };
                warn!(error = %err, "peak cache disabled, waveforms will be regenerated");
                Self::disabled()
            }
        }
    }

    /// A storage that never persists anything.
    pub fn disabled() -> Self {
        Self {
            root: None,
            temp_counter: AtomicU64::new(0),
        }
    }

    pub fn is_available(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn entry_path(&self, key: &CacheKey) -> Option<PathBuf> {
        self.root.as_ref().map(|r| r.join(key.file_name()))
    }

    /// Read the entry for `key`. Missing, unreadable and malformed entries
    /// all come back as `None`.
    pub fn load(&self, key: &CacheKey) -> Option<PeakSet> {
        let path = self.entry_path(key)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable cache entry, treating as missing");
                return None;
            }
        };

        match parse_peaks(&text) {
            Ok(peaks) => Some(peaks),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache entry, treating as missing");
                None
            }
        }
    }

    /// Persist `peaks` under `key`, replacing any previous entry atomically.
    pub fn store(&self, key: &CacheKey, peaks: &PeakSet) -> Result<(), StorageError> {
        let Some(root) = self.root.as_ref() else {
            return Ok(());
        };
        let target = root.join(key.file_name());
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let temp = root.join(format!(
            ".{}.{}-{}.tmp",
            key.file_name(),
            std::process::id(),
            n
        ));

        let written = write_peaks(&temp, peaks).and_then(|()| fs::rename(&temp, &target));
        if let Err(source) = written {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::Write {
                path: target,
                source,
            });
        }
        Ok(())
    }
}

fn write_peaks(path: &Path, peaks: &PeakSet) -> io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    out.write_all(format_peaks(peaks).as_bytes())?;
    let file = out.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

/// Render `peaks` in the cache text format.
pub fn format_peaks(peaks: &PeakSet) -> String {
    let mut text = String::new();
    for frame in peaks.frames() {
        let line: Vec<String> = frame
            .channels
            .iter()
            .flat_map(|p| [p.min.to_string(), p.max.to_string()])
            .collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    text
}

/// Parse the cache text format. Blank lines are skipped.
pub fn parse_peaks(text: &str) -> Result<PeakSet, FormatError> {
    let mut frames = Vec::new();
    let mut expected: Option<usize> = None;

    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let fields: Vec<&str> = raw.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() % 2 != 0 {
            return Err(FormatError::OddFieldCount {
                line,
                count: fields.len(),
            });
        }
        match expected {
            Some(n) if n != fields.len() => {
                return Err(FormatError::ChannelMismatch {
                    line,
                    count: fields.len(),
                    expected: n,
                });
            }
            _ => expected = Some(fields.len()),
        }

        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            let v: f32 = field.parse().map_err(|_| FormatError::NotANumber {
                line,
                field: field.to_string(),
            })?;
            values.push(v);
        }
        let channels = values
            .chunks_exact(2)
            .map(|pair| Peak {
                min: pair[0],
                max: pair[1],
            })
            .collect();
        frames.push(PeakFrame::new(channels));
    }

    // Every line was checked against `expected`, so channel counts agree.
    Ok(PeakSet::from_frames(frames).unwrap_or_default())
}
