//! Path normalization shared by the scanner, the database and the cache.
//!
//! An [`AssetPath`] is the canonical string form of a file path: every run of
//! `/` or `\` becomes a single host separator and a trailing separator is
//! dropped. Equal files always produce equal `AssetPath`s.

use std::fmt;
use std::path::{MAIN_SEPARATOR, Path};

/// A normalized filesystem path.
///
/// An empty `AssetPath` means the input was unusable (missing or blank).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetPath(String);

impl AssetPath {
    /// Normalize `raw` into an `AssetPath`.
    pub fn new(raw: &str) -> Self {
        Self(normalize_str(raw))
    }

    /// Normalize a `Path`, replacing non-UTF-8 bytes lossily.
    pub fn from_path(path: &Path) -> Self {
        Self::new(&path.to_string_lossy())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// File name without its extension, if there is one.
    pub fn file_stem(&self) -> Option<&str> {
        self.as_path().file_stem().and_then(|s| s.to_str())
    }

    pub fn is_absolute(&self) -> bool {
        self.as_path().is_absolute()
    }

    /// Resolve a relative path against the current directory.
    ///
    /// Cache keys hash the path string, so a relative path would map the same
    /// key to different files depending on where the program was started.
    /// Falls back to `self` if the current directory cannot be read.
    pub fn to_absolute(&self) -> AssetPath {
        if self.is_empty() || self.is_absolute() {
            return self.clone();
        }
        match std::path::absolute(self.as_path()) {
            Ok(abs) => Self::from_path(&abs),
            Err(_) => self.clone(),
        }
    }

    /// Lowercased extension, if there is one.
    pub fn extension_lower(&self) -> Option<String> {
        self.as_path()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for AssetPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

/// Normalize an optional raw path. `None` yields an empty `AssetPath`.
pub fn normalize(raw: Option<&str>) -> AssetPath {
    raw.map(AssetPath::new).unwrap_or_default()
}

fn normalize_str(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_separator_run = false;

    for c in raw.chars() {
        if c == '/' || c == '\\' {
            if !in_separator_run {
                out.push(MAIN_SEPARATOR);
            }
            in_separator_run = true;
        } else {
            out.push(c);
            in_separator_run = false;
        }
    }

    // A bare root keeps its only separator.
    if out.len() > 1 && out.ends_with(MAIN_SEPARATOR) {
        out.pop();
    }
    out
}
