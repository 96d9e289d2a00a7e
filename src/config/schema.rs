use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/sampleshelf/config.toml` or `~/.config/sampleshelf/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SAMPLESHELF__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub cache: CacheSettings,
    pub ui: UiSettings,
    pub audio: AudioSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory depth. The root counts as depth 0.
    pub max_depth: Option<usize>,

    /// Which fields build a record's label in the sample list, in order.
    ///
    /// Example: ["title", "duration"] -> "Kick 01 - 0:01"
    pub display_fields: Vec<DisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec![
                "wav".into(),
                "mp3".into(),
                "flac".into(),
                "ogg".into(),
                "m4a".into(),
            ],
            follow_links: false,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            display_fields: vec![DisplayField::Title],
            display_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayField {
    /// `title` metadata, falling back to the file name.
    Title,
    Filename,
    Path,
    Duration,
    Tags,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Directory holding one peak file per asset.
    /// Defaults to `$XDG_CACHE_HOME/sampleshelf/peaks` or `~/.cache/sampleshelf/peaks`.
    pub dir: Option<PathBuf>,
    /// Peak frames generated per second of audio.
    pub resolution: u32,
    /// Number of background generation workers.
    pub workers: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            resolution: 100,
            workers: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// How many rows around the selection get their waveform requested ahead of time.
    pub prefetch_rows: usize,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ sampleshelf ~ ".to_string(),
            prefetch_rows: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Whether to open an output device for auditioning samples.
    pub audition: bool,
    /// Audition volume (1.0 = unchanged).
    pub volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            audition: true,
            volume: 0.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` filter directive, e.g. "warn" or "sampleshelf=debug".
    /// `SAMPLESHELF_LOG` wins when set.
    pub level: String,
    /// Log file. Defaults to `sampleshelf.log` next to the peak cache.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}
