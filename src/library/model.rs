use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::path::AssetPath;

/// Where a record came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Source {
    /// Discovered by scanning the local library.
    Local,
    /// Delivered by a remote search response.
    Remote,
}

/// Identity of a media record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaId {
    Local(AssetPath),
    Remote(String),
}

impl MediaId {
    /// The local asset path, if this identity points at a file on disk.
    pub fn asset_path(&self) -> Option<&AssetPath> {
        match self {
            MediaId::Local(p) => Some(p),
            MediaId::Remote(_) => None,
        }
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaId::Local(p) => write!(f, "{p}"),
            MediaId::Remote(id) => write!(f, "remote:{id}"),
        }
    }
}

/// A single display metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Text(String),
    Number(f64),
    Duration(Duration),
    Tags(Vec<String>),
}

impl MetaValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            MetaValue::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

pub type Metadata = BTreeMap<String, MetaValue>;

/// Well-known metadata keys.
pub mod keys {
    pub const TITLE: &str = "title";
    pub const ARTIST: &str = "artist";
    pub const DURATION: &str = "duration";
    pub const SAMPLE_RATE: &str = "sample_rate";
    pub const CHANNELS: &str = "channels";
    pub const TAGS: &str = "tags";
}

/// One entry in the media database.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRecord {
    pub id: MediaId,
    pub metadata: Metadata,
    pub source: Source,
    /// Whether the metadata probe already ran for this record.
    pub probed: bool,
}

impl MediaRecord {
    /// A freshly scanned local asset; metadata is filled in later.
    pub fn local(path: AssetPath) -> Self {
        Self {
            id: MediaId::Local(path),
            metadata: Metadata::new(),
            source: Source::Local,
            probed: false,
        }
    }

    /// A record from a remote search response, complete as delivered.
    pub fn remote(id: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: MediaId::Remote(id.into()),
            metadata,
            source: Source::Remote,
            probed: true,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata
            .get(keys::TITLE)
            .and_then(MetaValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn duration(&self) -> Option<Duration> {
        self.metadata.get(keys::DURATION).and_then(MetaValue::as_duration)
    }

    pub fn tags(&self) -> &[String] {
        match self.metadata.get(keys::TAGS) {
            Some(MetaValue::Tags(t)) => t,
            _ => &[],
        }
    }
}
