//! The session: one object owning the media database and the waveform cache
//! for the lifetime of the program.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Settings;
use crate::library::{self, MediaDatabase, MediaId, MediaRecord, ScanSkip, Source};
use crate::path::AssetPath;
use crate::remote::{RemoteError, RemoteSearch};
use crate::waveform::{CacheStorage, DecoderPeakGenerator, PeakGenerator, PeakStatus, WaveformCache};

/// Result of a library scan, after the database was replaced.
#[derive(Debug)]
pub struct ScanSummary {
    pub root: AssetPath,
    pub found: usize,
    pub skipped: Vec<ScanSkip>,
}

pub struct Session {
    settings: Settings,
    library_root: Option<AssetPath>,
    database: MediaDatabase,
    waveforms: WaveformCache,
}

impl Session {
    /// A session that decodes audio with the built-in rodio decoder.
    pub fn new(settings: Settings) -> Self {
        Self::with_generator(settings, Arc::new(DecoderPeakGenerator))
    }

    pub fn with_generator(settings: Settings, generator: Arc<dyn PeakGenerator>) -> Self {
        let storage = match settings.cache.resolved_dir() {
            Some(dir) => CacheStorage::open(dir),
            None => {
                warn!("no cache directory configured and no HOME, peak cache disabled");
                CacheStorage::disabled()
            }
        };
        let waveforms = WaveformCache::new(
            storage,
            generator,
            settings.cache.resolution,
            settings.cache.workers,
        );

        Self {
            settings,
            library_root: None,
            database: MediaDatabase::new(),
            waveforms,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn database(&self) -> &MediaDatabase {
        &self.database
    }

    pub fn waveforms(&mut self) -> &mut WaveformCache {
        &mut self.waveforms
    }

    pub fn library_root(&self) -> Option<&AssetPath> {
        self.library_root.as_ref()
    }

    /// Scan `root` and replace the database with what was found.
    ///
    /// A relative `root` is resolved against the current directory first, so
    /// every asset in the database is absolute. Remembered waveform failures
    /// are dropped: files may have changed since they were tried.
    pub fn scan(&mut self, root: &AssetPath) -> ScanSummary {
        let root = root.to_absolute();
        let outcome = library::scan(&root, &self.settings.library);
        let found = outcome.assets.len();
        self.database
            .replace_all(library::records_from_scan(outcome.assets));
        self.library_root = Some(root.clone());
        self.waveforms.clear_failures();
        self.sync_waveforms();

        info!(root = %root, found, skipped = outcome.skipped.len(), "library scanned");
        ScanSummary {
            root,
            found,
            skipped: outcome.skipped,
        }
    }

    /// Scan the last scanned root again.
    pub fn rescan(&mut self) -> Option<ScanSummary> {
        let root = self.library_root.clone()?;
        Some(self.scan(&root))
    }

    /// Replace the database with a remote result set.
    ///
    /// On any error the current snapshot is kept untouched.
    pub fn apply_search(
        &mut self,
        provider: &dyn RemoteSearch,
        query: &str,
    ) -> Result<usize, RemoteError> {
        let records = provider.search(query)?;
        if let Some(local) = records.iter().find(|r| r.source != Source::Remote) {
            return Err(RemoteError::NotRemote(local.id.to_string()));
        }
        let n = records.len();
        self.database.replace_all(records);
        self.sync_waveforms();
        info!(query, results = n, "remote search applied");
        Ok(n)
    }

    /// Probe tags for the record at `index` if that has not happened yet.
    /// Returns `true` when metadata changed.
    pub fn ensure_metadata(&mut self, index: usize) -> bool {
        let Some(record) = self.database.list().get(index) else {
            return false;
        };
        if record.probed {
            return false;
        }
        let id = record.id.clone();
        let metadata = match id.asset_path() {
            Some(path) => library::probe(path.as_path()),
            None => Default::default(),
        };
        self.database.set_metadata(&id, metadata)
    }

    /// Label for `record` per the library display settings.
    pub fn label(&self, record: &MediaRecord) -> String {
        library::label_from_fields(
            record,
            &self.settings.library.display_fields,
            &self.settings.library.display_separator,
        )
    }

    /// Drop in-memory waveforms of assets the database no longer holds.
    fn sync_waveforms(&mut self) {
        let database = &self.database;
        self.waveforms
            .retain(|asset| database.get(&MediaId::Local(asset.clone())).is_some());
    }

    /// Waveform status for a record. Remote records have no local audio.
    pub fn peaks_for(&mut self, id: &MediaId) -> Option<PeakStatus> {
        id.asset_path().map(|path| self.waveforms.request(path))
    }
}
