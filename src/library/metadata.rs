//! Lazy metadata probe for local assets.
//!
//! Scanning only records paths; tags and stream properties are read here when
//! a record first becomes visible.

use std::path::Path;
use std::time::Duration;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use tracing::debug;

use super::model::{Metadata, MetaValue, keys};

/// Read title, artist, duration and stream properties from `path`.
///
/// Files lofty cannot parse still get a `title` derived from the file stem,
/// so the result is never empty for a path with a file name.
pub fn probe(path: &Path) -> Metadata {
    let mut metadata = Metadata::new();

    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        if !stem.trim().is_empty() {
            metadata.insert(keys::TITLE.to_string(), MetaValue::Text(stem.to_string()));
        }
    }

    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable tags");
            return metadata;
        }
    };

    let properties = tagged.properties();
    let duration = properties.duration();
    if duration > Duration::ZERO {
        metadata.insert(keys::DURATION.to_string(), MetaValue::Duration(duration));
    }
    if let Some(rate) = properties.sample_rate() {
        metadata.insert(keys::SAMPLE_RATE.to_string(), MetaValue::Number(f64::from(rate)));
    }
    if let Some(channels) = properties.channels() {
        metadata.insert(keys::CHANNELS.to_string(), MetaValue::Number(f64::from(channels)));
    }

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = tag.title() {
            let v = v.trim();
            if !v.is_empty() {
                metadata.insert(keys::TITLE.to_string(), MetaValue::Text(v.to_string()));
            }
        }
        if let Some(v) = tag.artist() {
            let v = v.trim();
            if !v.is_empty() {
                metadata.insert(keys::ARTIST.to_string(), MetaValue::Text(v.to_string()));
            }
        }
        if let Some(v) = tag.genre() {
            let tags: Vec<String> = v
                .split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !tags.is_empty() {
                metadata.insert(keys::TAGS.to_string(), MetaValue::Tags(tags));
            }
        }
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn unreadable_file_still_gets_a_title_from_its_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Kick 01.wav");
        fs::write(&path, b"not a real wav").unwrap();

        let metadata = probe(&path);
        assert_eq!(
            metadata.get(keys::TITLE),
            Some(&MetaValue::Text("Kick 01".to_string()))
        );
        assert!(metadata.get(keys::DURATION).is_none());
    }

    #[test]
    fn missing_file_does_not_panic() {
        let metadata = probe(Path::new("/definitely/not/here/loop.flac"));
        assert_eq!(
            metadata.get(keys::TITLE).and_then(MetaValue::as_text),
            Some("loop")
        );
    }
}
