//! # mosaic-scope
//!
//! The object store ("scope") behind a workspace:
//! - content-addressed snapshots and file blobs (append-only, first
//!   write wins)
//! - one history per component: ordered log, tag aliases, lane heads
//! - `MemoryStore` (reference semantics, tests) and `FsStore`
//!   (fan-out directories, atomic writes)
//!
//! The scope never interprets override sets or dependency policy; it
//! stores and retrieves. Resolution lives in `mosaic-workspace`.

pub mod fs;
pub mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use mosaic_model::{ComponentId, FileHash, SnapHash, Snapshot, SourceFile, VersionRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// The lane every workspace starts on.
pub const DEFAULT_LANE: &str = "main";

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("snapshot `{hash}` not found")]
    SnapshotNotFound { hash: SnapHash },
    #[error("file blob `{hash}` not found")]
    BlobNotFound { hash: FileHash },
    #[error("component `{id}` has no history in this scope")]
    UnknownComponent { id: String },
    #[error("tag `{tag}` is not defined for component `{id}`")]
    UnknownTag { id: String, tag: String },
    #[error("snapshot `{hash}` is not in the history of `{id}`")]
    NotInHistory { id: String, hash: SnapHash },
    #[error("object `{expected}` hashed to `{actual}` on read")]
    HashMismatch { expected: String, actual: String },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt object at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Everything the scope knows about one component: the append-only log
/// (oldest first), tag aliases, and the head of each lane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHistory {
    #[serde(default)]
    pub log: Vec<SnapHash>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, SnapHash>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub heads: BTreeMap<String, SnapHash>,
}

impl ComponentHistory {
    pub fn contains(&self, hash: &SnapHash) -> bool {
        self.log.contains(hash)
    }

    pub fn head(&self, lane: &str) -> Option<&SnapHash> {
        self.heads.get(lane)
    }

    /// Resolve a version reference against this history: tags map
    /// through the alias table, snap hashes must appear in the log.
    pub fn resolve(&self, id: &str, version: &VersionRef) -> Result<SnapHash, ScopeError> {
        match version {
            VersionRef::Tag(tag) => self
                .tags
                .get(tag)
                .cloned()
                .ok_or_else(|| ScopeError::UnknownTag { id: id.to_string(), tag: tag.clone() }),
            VersionRef::Snap(hash) => {
                if self.contains(hash) {
                    Ok(hash.clone())
                } else {
                    Err(ScopeError::NotInHistory { id: id.to_string(), hash: hash.clone() })
                }
            }
        }
    }

    /// Every version a caller can name: tags first, then untagged snaps.
    pub fn versions(&self) -> Vec<VersionRef> {
        let mut versions: Vec<VersionRef> =
            self.tags.keys().map(|tag| VersionRef::Tag(tag.clone())).collect();
        let tagged: Vec<&SnapHash> = self.tags.values().collect();
        versions.extend(
            self.log.iter().filter(|h| !tagged.contains(h)).map(|h| VersionRef::Snap(h.clone())),
        );
        versions
    }
}

/// Storage seam for snapshots, blobs, and histories. Object writes are
/// append-only: re-putting an existing hash is a no-op.
pub trait ObjectStore {
    fn get_snapshot(&self, hash: &SnapHash) -> Result<Snapshot, ScopeError>;
    fn get_file(&self, hash: &FileHash) -> Result<Vec<u8>, ScopeError>;
    fn get_history(&self, id: &ComponentId) -> Result<ComponentHistory, ScopeError>;
    fn has_history(&self, id: &ComponentId) -> bool;

    /// Store a snapshot and its file blobs, append it to the component's
    /// log, and move the lane head. Returns the content address.
    fn put_snapshot(
        &mut self,
        id: &ComponentId,
        snapshot: &Snapshot,
        files: &[SourceFile],
        lane: &str,
    ) -> Result<SnapHash, ScopeError>;

    /// Point a tag alias at an existing snapshot.
    fn set_tag(&mut self, id: &ComponentId, tag: &str, hash: &SnapHash)
    -> Result<(), ScopeError>;

    fn contains_snapshot(&self, hash: &SnapHash) -> bool {
        self.get_snapshot(hash).is_ok()
    }

    /// The component's snapshots, oldest first.
    fn get_log(&self, id: &ComponentId) -> Result<Vec<(SnapHash, Snapshot)>, ScopeError> {
        let history = self.get_history(id)?;
        history
            .log
            .iter()
            .map(|hash| Ok((hash.clone(), self.get_snapshot(hash)?)))
            .collect()
    }

    fn resolve_version(
        &self,
        id: &ComponentId,
        version: &VersionRef,
    ) -> Result<SnapHash, ScopeError> {
        let history = self.get_history(id)?;
        history.resolve(&id.to_string_no_version(), version)
    }

    fn list_versions(&self, id: &ComponentId) -> Result<Vec<VersionRef>, ScopeError> {
        Ok(self.get_history(id)?.versions())
    }
}

/// History bookkeeping shared by the backends: append the hash once,
/// move the lane head, record the log entry's tag when it has one.
pub(crate) fn record_snapshot(
    history: &mut ComponentHistory,
    hash: &SnapHash,
    snapshot: &Snapshot,
    lane: &str,
) {
    if !history.contains(hash) {
        history.log.push(hash.clone());
    }
    history.heads.insert(lane.to_string(), hash.clone());
    if let Some(tag) = &snapshot.log.tag {
        history.tags.insert(tag.clone(), hash.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(fill: char) -> SnapHash {
        SnapHash(fill.to_string().repeat(64))
    }

    #[test]
    fn resolve_tag_and_snap() {
        let mut history = ComponentHistory::default();
        history.log.push(hash('a'));
        history.tags.insert("1.0.0".to_string(), hash('a'));

        let by_tag = history.resolve("acme/button", &VersionRef::Tag("1.0.0".to_string()));
        assert_eq!(by_tag.expect("tag resolves"), hash('a'));

        let by_hash = history.resolve("acme/button", &VersionRef::Snap(hash('a')));
        assert_eq!(by_hash.expect("hash resolves"), hash('a'));

        let unknown_tag = history.resolve("acme/button", &VersionRef::Tag("2.0.0".to_string()));
        assert!(matches!(unknown_tag, Err(ScopeError::UnknownTag { .. })));

        let foreign = history.resolve("acme/button", &VersionRef::Snap(hash('b')));
        assert!(matches!(foreign, Err(ScopeError::NotInHistory { .. })));
    }

    #[test]
    fn versions_lists_tags_then_untagged_snaps() {
        let mut history = ComponentHistory::default();
        history.log.push(hash('a'));
        history.log.push(hash('b'));
        history.tags.insert("1.0.0".to_string(), hash('a'));
        let versions = history.versions();
        assert_eq!(
            versions,
            vec![VersionRef::Tag("1.0.0".to_string()), VersionRef::Snap(hash('b'))]
        );
    }
}
