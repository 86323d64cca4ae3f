//! In-memory store: the reference semantics and the test backend.

use crate::{ComponentHistory, ObjectStore, ScopeError, record_snapshot};
use mosaic_model::{ComponentId, FileHash, SnapHash, Snapshot, SourceFile};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: BTreeMap<SnapHash, Snapshot>,
    blobs: BTreeMap<FileHash, Vec<u8>>,
    histories: BTreeMap<String, ComponentHistory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}

impl ObjectStore for MemoryStore {
    fn get_snapshot(&self, hash: &SnapHash) -> Result<Snapshot, ScopeError> {
        self.snapshots
            .get(hash)
            .cloned()
            .ok_or_else(|| ScopeError::SnapshotNotFound { hash: hash.clone() })
    }

    fn get_file(&self, hash: &FileHash) -> Result<Vec<u8>, ScopeError> {
        self.blobs
            .get(hash)
            .cloned()
            .ok_or_else(|| ScopeError::BlobNotFound { hash: hash.clone() })
    }

    fn get_history(&self, id: &ComponentId) -> Result<ComponentHistory, ScopeError> {
        self.histories
            .get(&id.to_string_no_version())
            .cloned()
            .ok_or_else(|| ScopeError::UnknownComponent { id: id.to_string_no_version() })
    }

    fn has_history(&self, id: &ComponentId) -> bool {
        self.histories.contains_key(&id.to_string_no_version())
    }

    fn put_snapshot(
        &mut self,
        id: &ComponentId,
        snapshot: &Snapshot,
        files: &[SourceFile],
        lane: &str,
    ) -> Result<SnapHash, ScopeError> {
        let hash = snapshot.snap_hash();
        for file in files {
            // first write wins: identical content is already present
            self.blobs.entry(file.hash.clone()).or_insert_with(|| file.content.clone());
        }
        self.snapshots.entry(hash.clone()).or_insert_with(|| snapshot.normalized());
        let history = self.histories.entry(id.to_string_no_version()).or_default();
        record_snapshot(history, &hash, snapshot, lane);
        Ok(hash)
    }

    fn set_tag(
        &mut self,
        id: &ComponentId,
        tag: &str,
        hash: &SnapHash,
    ) -> Result<(), ScopeError> {
        if !self.snapshots.contains_key(hash) {
            return Err(ScopeError::SnapshotNotFound { hash: hash.clone() });
        }
        let key = id.to_string_no_version();
        let history = self
            .histories
            .get_mut(&key)
            .ok_or(ScopeError::UnknownComponent { id: key.clone() })?;
        if !history.contains(hash) {
            return Err(ScopeError::NotInHistory { id: key, hash: hash.clone() });
        }
        history.tags.insert(tag.to_string(), hash.clone());
        Ok(())
    }

    fn contains_snapshot(&self, hash: &SnapHash) -> bool {
        self.snapshots.contains_key(hash)
    }
}
