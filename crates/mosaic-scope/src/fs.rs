//! Filesystem store.
//!
//! Layout under the scope root:
//!
//! ```text
//! objects/<first two hex chars>/<hash>.json   snapshot objects
//! blobs/<first two hex chars>/<hash>          file contents
//! components/<scope>__<name>.json             per-component histories
//! ```
//!
//! Objects and blobs are append-only; existing paths are never
//! rewritten. Every write lands through a temp file in the target
//! directory followed by rename and a parent-directory fsync, so a
//! crash leaves either the old state or the new one.

use crate::{ComponentHistory, ObjectStore, ScopeError, record_snapshot};
use mosaic_model::{ComponentId, FileHash, SnapHash, Snapshot, SourceFile};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

const OBJECTS_DIR: &str = "objects";
const BLOBS_DIR: &str = "blobs";
const COMPONENTS_DIR: &str = "components";

#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn snapshot_path(&self, hash: &SnapHash) -> PathBuf {
        let (prefix, _) = fan_out(hash.as_str());
        self.root.join(OBJECTS_DIR).join(prefix).join(format!("{hash}.json"))
    }

    fn blob_path(&self, hash: &FileHash) -> PathBuf {
        let (prefix, _) = fan_out(hash.as_str());
        self.root.join(BLOBS_DIR).join(prefix).join(hash.as_str())
    }

    fn history_path(&self, id: &ComponentId) -> PathBuf {
        self.root.join(COMPONENTS_DIR).join(format!("{}.json", history_file_stem(id)))
    }

    fn read_history(&self, id: &ComponentId) -> Result<ComponentHistory, ScopeError> {
        let path = self.history_path(id);
        if !path.exists() {
            return Err(ScopeError::UnknownComponent { id: id.to_string_no_version() });
        }
        let bytes = fs::read(&path).map_err(|source| ScopeError::Io { path: path.clone(), source })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ScopeError::Corrupt { path, reason: e.to_string() })
    }

    fn write_history(
        &self,
        id: &ComponentId,
        history: &ComponentHistory,
    ) -> Result<(), ScopeError> {
        let path = self.history_path(id);
        let bytes = serde_json::to_vec_pretty(history)
            .map_err(|e| ScopeError::Corrupt { path: path.clone(), reason: e.to_string() })?;
        atomic_write(&path, &bytes)
    }
}

impl ObjectStore for FsStore {
    fn get_snapshot(&self, hash: &SnapHash) -> Result<Snapshot, ScopeError> {
        let path = self.snapshot_path(hash);
        if !path.exists() {
            return Err(ScopeError::SnapshotNotFound { hash: hash.clone() });
        }
        let bytes = fs::read(&path).map_err(|source| ScopeError::Io { path: path.clone(), source })?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| ScopeError::Corrupt { path, reason: e.to_string() })?;
        let actual = snapshot.snap_hash();
        if actual != *hash {
            return Err(ScopeError::HashMismatch {
                expected: hash.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(snapshot)
    }

    fn get_file(&self, hash: &FileHash) -> Result<Vec<u8>, ScopeError> {
        let path = self.blob_path(hash);
        if !path.exists() {
            return Err(ScopeError::BlobNotFound { hash: hash.clone() });
        }
        let bytes = fs::read(&path).map_err(|source| ScopeError::Io { path: path.clone(), source })?;
        let actual = FileHash::of_bytes(&bytes);
        if actual != *hash {
            return Err(ScopeError::HashMismatch {
                expected: hash.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(bytes)
    }

    fn get_history(&self, id: &ComponentId) -> Result<ComponentHistory, ScopeError> {
        self.read_history(id)
    }

    fn has_history(&self, id: &ComponentId) -> bool {
        self.history_path(id).exists()
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
            let path = self.blob_path(&file.hash);
            if !path.exists() {
                atomic_write(&path, &file.content)?;
            }
        }
        let object_path = self.snapshot_path(&hash);
        if !object_path.exists() {
            let bytes = serde_json::to_vec_pretty(&snapshot.normalized()).map_err(|e| {
                ScopeError::Corrupt { path: object_path.clone(), reason: e.to_string() }
            })?;
            atomic_write(&object_path, &bytes)?;
        }
        let mut history = match self.read_history(id) {
            Ok(history) => history,
            Err(ScopeError::UnknownComponent { .. }) => ComponentHistory::default(),
            Err(e) => return Err(e),
        };
        record_snapshot(&mut history, &hash, snapshot, lane);
        self.write_history(id, &history)?;
        debug!(id = %id.to_string_no_version(), hash = %hash.short(), lane, "stored snapshot");
        Ok(hash)
    }

    fn set_tag(
        &mut self,
        id: &ComponentId,
        tag: &str,
        hash: &SnapHash,
    ) -> Result<(), ScopeError> {
        if !self.contains_snapshot(hash) {
            return Err(ScopeError::SnapshotNotFound { hash: hash.clone() });
        }
        let mut history = self.read_history(id)?;
        if !history.contains(hash) {
            return Err(ScopeError::NotInHistory {
                id: id.to_string_no_version(),
                hash: hash.clone(),
            });
        }
        history.tags.insert(tag.to_string(), hash.clone());
        self.write_history(id, &history)
    }

    fn contains_snapshot(&self, hash: &SnapHash) -> bool {
        self.snapshot_path(hash).exists()
    }
}

fn fan_out(hash: &str) -> (&str, &str) {
    hash.split_at(2.min(hash.len()))
}

fn history_file_stem(id: &ComponentId) -> String {
    id.to_string_no_version().replace('/', "__")
}

/// Write bytes so a crash at any point leaves the old file or the new
/// one, never a partial mix.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), ScopeError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|source| ScopeError::Io { path: parent.to_path_buf(), source })?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    })();
    if let Err(source) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(ScopeError::Io { path: tmp_path, source });
    }

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(ScopeError::Io { path: path.to_path_buf(), source });
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let dir = File::open(parent)
            .map_err(|source| ScopeError::Io { path: parent.to_path_buf(), source })?;
        dir.sync_all()
            .map_err(|source| ScopeError::Io { path: parent.to_path_buf(), source })?;
    }
    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}
