//! In-memory media database.
//!
//! The database is a snapshot: an ordered list of records plus an identity
//! index. It is replaced wholesale after each scan or remote search; the only
//! in-place change allowed is filling in metadata for an existing record.

use std::collections::HashMap;

use crate::path::AssetPath;

use super::model::{MediaId, MediaRecord, Metadata};

#[derive(Debug, Default)]
pub struct MediaDatabase {
    records: Vec<MediaRecord>,
    index: HashMap<MediaId, usize>,
}

impl MediaDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new snapshot. Previous records are dropped entirely.
    ///
    /// When `records` repeats an identity, every copy stays in the list but
    /// lookups resolve to the first one.
    pub fn replace_all(&mut self, records: Vec<MediaRecord>) {
        let mut index = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            index.entry(r.id.clone()).or_insert(i);
        }
        self.records = records;
        self.index = index;
    }

    /// All records in insertion order.
    pub fn list(&self) -> &[MediaRecord] {
        &self.records
    }

    pub fn get(&self, id: &MediaId) -> Option<&MediaRecord> {
        self.index.get(id).and_then(|&i| self.records.get(i))
    }

    pub fn position(&self, id: &MediaId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Merge `metadata` into an existing record and mark it probed.
    /// Returns `false` when `id` is unknown.
    pub fn set_metadata(&mut self, id: &MediaId, metadata: Metadata) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        match self.records.get_mut(i) {
            Some(record) => {
                record.metadata.extend(metadata);
                record.probed = true;
                true
            }
            None => false,
        }
    }
}

/// Turn scanner output into local records, preserving scan order.
pub fn records_from_scan(assets: Vec<AssetPath>) -> Vec<MediaRecord> {
    assets.into_iter().map(MediaRecord::local).collect()
}
