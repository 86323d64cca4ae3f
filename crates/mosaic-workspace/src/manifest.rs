//! The manifest: the single mutable registry of workspace components.
//!
//! One entry per component: where it lives, which version is checked
//! out, its own config (the policy ops mutate exactly this), pending
//! version metadata, and the soft-removed marker. All mutation passes
//! through `&mut` methods that set a changed flag; `write` flushes at
//! most once per batch, labeled with the reason, and keeps a backup of
//! every flushed generation.

use mosaic_model::{ComponentId, OverrideSet, VersionRef};
use mosaic_scope::fs::atomic_write;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const MANIFEST_SCHEMA: &str = "mosaic-manifest/1";
pub const MANIFEST_DIR: &str = ".mosaic";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const HISTORY_DIR: &str = "manifest-history";
pub const HISTORY_METADATA_FILE: &str = "manifest-history-metadata.txt";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt manifest at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("unsupported manifest schema `{schema}` at {path}")]
    UnsupportedSchema { schema: String, path: PathBuf },
}

impl From<mosaic_scope::ScopeError> for ManifestError {
    fn from(e: mosaic_scope::ScopeError) -> Self {
        match e {
            mosaic_scope::ScopeError::Io { path, source } => ManifestError::Io { path, source },
            other => ManifestError::Corrupt { path: PathBuf::new(), reason: other.to_string() },
        }
    }
}

/// Version planned for the next snapshot of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextVersion {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Component id without version.
    pub id: ComponentId,
    /// Directory of the working copy, relative to the workspace root.
    pub location: String,
    /// Currently checked-out version, reflecting the current lane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionRef>,
    /// The component's own config; the target of the policy operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<OverrideSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_version: Option<NextVersion>,
    /// Soft-removed: still tracked, excluded from listings by default.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub removed: bool,
}

impl ManifestEntry {
    pub fn new(id: ComponentId, location: impl Into<String>) -> Self {
        ManifestEntry {
            id: id.without_version(),
            location: location.into(),
            version: None,
            config: None,
            next_version: None,
            removed: false,
        }
    }
}

/// On-disk shape.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestFile {
    schema_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lane: Option<String>,
    #[serde(default)]
    components: BTreeMap<String, ManifestEntry>,
}

#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    lane: Option<String>,
    entries: BTreeMap<String, ManifestEntry>,
    changed: bool,
}

impl Manifest {
    /// An empty manifest that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Manifest { path: path.into(), lane: None, entries: BTreeMap::new(), changed: false }
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ManifestError> {
        let path = path.into();
        let bytes =
            fs::read(&path).map_err(|source| ManifestError::Io { path: path.clone(), source })?;
        let file: ManifestFile = serde_json::from_slice(&bytes)
            .map_err(|e| ManifestError::Corrupt { path: path.clone(), reason: e.to_string() })?;
        if file.schema_version != MANIFEST_SCHEMA {
            return Err(ManifestError::UnsupportedSchema { schema: file.schema_version, path });
        }
        Ok(Manifest { path, lane: file.lane, entries: file.components, changed: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lane(&self) -> Option<&str> {
        self.lane.as_deref()
    }

    pub fn set_lane(&mut self, lane: Option<String>) {
        self.lane = lane;
        self.changed = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.entries.iter()
    }

    pub fn get(&self, key: &str) -> Option<&ManifestEntry> {
        self.entries.get(key)
    }

    /// Ids of tracked components, in manifest order.
    pub fn list_ids(&self, include_removed: bool) -> Vec<ComponentId> {
        self.entries
            .values()
            .filter(|entry| include_removed || !entry.removed)
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Find the entry for an id. A scoped lookup is exact; an unscoped
    /// lookup falls back to a by-name search and only answers when it is
    /// unambiguous.
    pub fn find(&self, id: &ComponentId) -> Option<&ManifestEntry> {
        let key = id.to_string_no_version();
        if let Some(entry) = self.entries.get(&key) {
            return Some(entry);
        }
        if id.scope.is_none() {
            let mut matches = self.entries.values().filter(|entry| entry.id.name == id.name);
            if let (Some(entry), None) = (matches.next(), matches.next()) {
                return Some(entry);
            }
        }
        None
    }

    /// Like `find`, also yielding the entry key for mutation.
    pub fn find_key(&self, id: &ComponentId) -> Option<String> {
        self.find(id).map(|entry| entry.id.to_string_no_version())
    }

    pub fn upsert(&mut self, entry: ManifestEntry) {
        self.entries.insert(entry.id.to_string_no_version(), entry);
        self.changed = true;
    }

    pub fn set_component_config(&mut self, key: &str, config: Option<OverrideSet>) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.config = config;
                self.changed = true;
                true
            }
            None => false,
        }
    }

    pub fn set_version(&mut self, key: &str, version: VersionRef) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.version = Some(version);
                self.changed = true;
                true
            }
            None => false,
        }
    }

    pub fn set_next_version(&mut self, key: &str, next: NextVersion) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.next_version = Some(next);
                self.changed = true;
                true
            }
            None => false,
        }
    }

    pub fn clear_next_version(&mut self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.changed |= entry.next_version.take().is_some();
                true
            }
            None => false,
        }
    }

    pub fn mark_removed(&mut self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.removed = true;
                self.changed = true;
                true
            }
            None => false,
        }
    }

    pub fn remove_entries(&mut self, keys: &[String]) -> usize {
        let mut removed = 0;
        for key in keys {
            if self.entries.remove(key).is_some() {
                removed += 1;
                self.changed = true;
            }
        }
        removed
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Flush to disk if anything changed since the last flush. Exactly
    /// one call per user-facing batch; `reason` labels the write in the
    /// backup history. Returns whether a write happened.
    pub fn write(&mut self, reason: &str) -> Result<bool, ManifestError> {
        if !self.changed {
            return Ok(false);
        }
        let file = ManifestFile {
            schema_version: MANIFEST_SCHEMA.to_string(),
            lane: self.lane.clone(),
            components: self.entries.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file).map_err(|e| ManifestError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        atomic_write(&self.path, &bytes)?;
        self.backup(&bytes, reason)?;
        self.changed = false;
        debug!(path = %self.path.display(), reason, "manifest flushed");
        Ok(true)
    }

    /// Keep a copy of the flushed generation plus a metadata line
    /// `<file> <reason>`, so `why did my manifest change` is answerable.
    fn backup(&self, bytes: &[u8], reason: &str) -> Result<(), ManifestError> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        let history_dir = parent.join(HISTORY_DIR);
        fs::create_dir_all(&history_dir)
            .map_err(|source| ManifestError::Io { path: history_dir.clone(), source })?;
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S%.3f");
        let file_name = format!("manifest-{stamp}.json");
        atomic_write(&history_dir.join(&file_name), bytes)?;

        let metadata_path = history_dir.join(HISTORY_METADATA_FILE);
        let mut metadata = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&metadata_path)
            .map_err(|source| ManifestError::Io { path: metadata_path.clone(), source })?;
        writeln!(metadata, "{file_name} {reason}")
            .map_err(|source| ManifestError::Io { path: metadata_path, source })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, location: &str) -> ManifestEntry {
        ManifestEntry::new(ComponentId::parse(id).expect("valid id"), location)
    }

    fn manifest_with(entries: &[(&str, &str)]) -> (tempfile::TempDir, Manifest) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut manifest = Manifest::new(dir.path().join(MANIFEST_DIR).join(MANIFEST_FILE));
        for (id, location) in entries {
            manifest.upsert(entry(id, location));
        }
        (dir, manifest)
    }

    #[test]
    fn write_skips_when_unchanged() {
        let (_dir, mut manifest) = manifest_with(&[("acme/button", "components/button")]);
        assert!(manifest.write("initial").expect("write"));
        assert!(!manifest.write("noop").expect("write"), "unchanged manifest must not flush");
    }

    #[test]
    fn round_trips_entries_and_schema() {
        let (_dir, mut manifest) = manifest_with(&[("acme/button", "components/button")]);
        manifest.set_version("acme/button", VersionRef::Tag("1.0.0".to_string()));
        let mut config = OverrideSet::new();
        config.insert("dependencies", json!({"lodash": "4.17.21"}));
        manifest.set_component_config("acme/button", Some(config.clone()));
        manifest.write("setup").expect("write");

        let loaded = Manifest::load(manifest.path()).expect("load");
        let entry = loaded.get("acme/button").expect("entry exists");
        assert_eq!(entry.version, Some(VersionRef::Tag("1.0.0".to_string())));
        assert_eq!(entry.config.as_ref(), Some(&config));
        assert!(!loaded.has_changed());
    }

    #[test]
    fn rejects_unknown_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(MANIFEST_FILE);
        fs::write(&path, br#"{"schemaVersion": "mosaic-manifest/999", "components": {}}"#)
            .expect("seed file");
        assert!(matches!(Manifest::load(&path), Err(ManifestError::UnsupportedSchema { .. })));
    }

    #[test]
    fn every_flush_lands_in_history_with_reason() {
        let (_dir, mut manifest) = manifest_with(&[("acme/button", "components/button")]);
        manifest.write("deps-set (acme/*)").expect("first write");
        manifest.mark_changed();
        manifest.write("deps-remove (acme/*)").expect("second write");

        let history_dir = manifest.path().parent().expect("parent").join(HISTORY_DIR);
        let copies = fs::read_dir(&history_dir)
            .expect("history dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("manifest-"))
            .count();
        assert_eq!(copies, 2);

        let metadata =
            fs::read_to_string(history_dir.join(HISTORY_METADATA_FILE)).expect("metadata");
        assert!(metadata.contains("deps-set (acme/*)"));
        assert!(metadata.contains("deps-remove (acme/*)"));
    }

    #[test]
    fn unscoped_find_requires_unambiguity() {
        let (_dir, manifest) = manifest_with(&[
            ("acme/button", "components/button"),
            ("other/button", "components/other-button"),
            ("acme/card", "components/card"),
        ]);
        let unambiguous = ComponentId::parse("card").expect("valid id");
        assert!(manifest.find(&unambiguous).is_some());
        let ambiguous = ComponentId::parse("button").expect("valid id");
        assert!(manifest.find(&ambiguous).is_none(), "two scopes own `button`");
        let exact = ComponentId::parse("acme/button").expect("valid id");
        assert_eq!(manifest.find(&exact).map(|e| e.location.as_str()), Some("components/button"));
    }

    #[test]
    fn removed_entries_are_excluded_from_default_listing() {
        let (_dir, mut manifest) = manifest_with(&[
            ("acme/button", "components/button"),
            ("acme/card", "components/card"),
        ]);
        manifest.mark_removed("acme/card");
        assert_eq!(manifest.list_ids(false).len(), 1);
        assert_eq!(manifest.list_ids(true).len(), 2);
        // still findable for version resolution
        let id = ComponentId::parse("acme/card").expect("valid id");
        assert!(manifest.find(&id).is_some());
    }
}
