use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::path::AssetPath;

/// A subtree or entry the scanner could not read. The rest of the scan goes on.
#[derive(Debug, Error)]
#[error("skipped {path}: {source}")]
pub struct ScanSkip {
    pub path: AssetPath,
    #[source]
    pub source: walkdir::Error,
}

/// Everything a scan found, plus what it had to skip.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub assets: Vec<AssetPath>,
    pub skipped: Vec<ScanSkip>,
}

fn normalized_extensions(settings: &LibrarySettings) -> Vec<String> {
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn is_audio_file(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Walk `root` and return every file whose extension is on the allow-list.
///
/// Directories are expanded from an explicit worklist, one level at a time,
/// so depth is bounded by memory rather than the call stack. Unreadable
/// directories and entries end up in [`ScanOutcome::skipped`].
pub fn scan(root: &AssetPath, settings: &LibrarySettings) -> ScanOutcome {
    let exts = normalized_extensions(settings);
    let mut outcome = ScanOutcome::default();

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };

    // Only needed when links are followed: a link back up the tree would loop.
    let mut visited: HashSet<std::path::PathBuf> = HashSet::new();
    let mut worklist: Vec<(AssetPath, usize)> = vec![(root.clone(), 0)];

    while let Some((dir, depth)) = worklist.pop() {
        // A failed canonicalize is reported by the walk below.
        if settings.follow_links {
            if let Ok(canonical) = dir.as_path().canonicalize() {
                if !visited.insert(canonical) {
                    debug!(dir = %dir, "directory already visited, skipping");
                    continue;
                }
            }
        }

        let child_depth = depth + 1;
        let walker = WalkDir::new(dir.as_path())
            .min_depth(1)
            .max_depth(1)
            .follow_links(settings.follow_links);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(AssetPath::from_path)
                        .unwrap_or_else(|| dir.clone());
                    warn!(path = %path, error = %err, "scan skipped unreadable entry");
                    outcome.skipped.push(ScanSkip { path, source: err });
                    continue;
                }
            };

            let path = entry.path();
            if !settings.include_hidden && is_hidden(path) {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                if depth_cap.is_none_or(|cap| child_depth < cap) {
                    worklist.push((AssetPath::from_path(path), child_depth));
                }
            } else if file_type.is_file() && is_audio_file(path, &exts) {
                if depth_cap.is_none_or(|cap| child_depth <= cap) {
                    outcome.assets.push(AssetPath::from_path(path));
                }
            }
        }
    }

    debug!(
        root = %root,
        found = outcome.assets.len(),
        skipped = outcome.skipped.len(),
        "scan finished"
    );
    outcome
}
