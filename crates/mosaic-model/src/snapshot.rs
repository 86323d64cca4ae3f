//! Immutable, content-addressed snapshots.
//!
//! A snapshot is the persisted form of one component version. Every
//! collection in it is normalized (sorted) before hashing or comparison;
//! the hash covers all fields, so two snapshots are interchangeable
//! exactly when their hashes are equal.

use crate::component::Component;
use crate::dependency::DependencyKind;
use crate::hash::{FileHash, SnapHash};
use crate::overrides::OverrideSet;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub path: String,
    pub hash: FileHash,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRecord {
    pub id: String,
    pub version: String,
}

/// Who made the snapshot, when, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Tag assigned at snapshot time, when this snapshot was tagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        LogEntry { author: None, email: None, message: message.into(), timestamp, tag: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub files: Vec<FileRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dev_dependencies: Vec<DependencyRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peer_dependencies: Vec<DependencyRecord>,
    #[serde(default, skip_serializing_if = "OverrideSet::is_empty")]
    pub overrides: OverrideSet,
    pub log: LogEntry,
}

impl Snapshot {
    /// Build the candidate snapshot for a working-copy component. The
    /// caller supplies the log entry; comparisons pass the model
    /// snapshot's log so that only substantive fields can differ.
    pub fn from_component(component: &Component, log: LogEntry) -> Snapshot {
        let files = component
            .files
            .iter()
            .map(|file| FileRecord { path: file.path.clone(), hash: file.hash.clone() })
            .collect();
        let records = |kind: DependencyKind| -> Vec<DependencyRecord> {
            component
                .dependencies
                .of_kind(kind)
                .map(|dep| DependencyRecord { id: dep.name.clone(), version: dep.version.clone() })
                .collect()
        };
        let mut snapshot = Snapshot {
            files,
            dependencies: records(DependencyKind::Runtime),
            dev_dependencies: records(DependencyKind::Dev),
            peer_dependencies: records(DependencyKind::Peer),
            overrides: component.config.clone(),
            log,
        };
        snapshot.normalize();
        snapshot
    }

    pub fn dependencies_of_kind(&self, kind: DependencyKind) -> &[DependencyRecord] {
        match kind {
            DependencyKind::Runtime => &self.dependencies,
            DependencyKind::Dev => &self.dev_dependencies,
            DependencyKind::Peer => &self.peer_dependencies,
        }
    }

    pub fn dependencies_of_kind_mut(&mut self, kind: DependencyKind) -> &mut Vec<DependencyRecord> {
        match kind {
            DependencyKind::Runtime => &mut self.dependencies,
            DependencyKind::Dev => &mut self.dev_dependencies,
            DependencyKind::Peer => &mut self.peer_dependencies,
        }
    }

    /// Find a dependency record of any kind whose id names the same
    /// component or package, ignoring version.
    pub fn find_record_ignoring_version(&self, id: &str) -> Option<&DependencyRecord> {
        let wanted = crate::pkg::strip_version_suffix(id);
        DependencyKind::ALL
            .iter()
            .flat_map(|kind| self.dependencies_of_kind(*kind))
            .find(|record| crate::pkg::strip_version_suffix(&record.id) == wanted)
    }

    /// Sort every collection. Mandatory before hashing or comparing.
    pub fn normalize(&mut self) {
        self.files.sort();
        for kind in DependencyKind::ALL {
            self.dependencies_of_kind_mut(kind).sort();
        }
        // override maps are BTreeMap-backed and already ordered
    }

    pub fn normalized(&self) -> Snapshot {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// The content address. Covers every field of the normalized
    /// snapshot, so collection order never affects it.
    pub fn snap_hash(&self) -> SnapHash {
        let n = self.normalized();
        let mut builder = SnapHash::builder();
        for file in &n.files {
            builder = builder.field("file", &format!("{}:{}", file.path, file.hash));
        }
        for kind in DependencyKind::ALL {
            for record in n.dependencies_of_kind(kind) {
                builder =
                    builder.field(kind.field_name(), &format!("{}@{}", record.id, record.version));
            }
        }
        for (field, value) in n.overrides.fields() {
            builder = builder.field(&format!("override.{field}"), &value.to_string());
        }
        builder = builder
            .field_opt("author", n.log.author.as_deref())
            .field_opt("email", n.log.email.as_deref())
            .field("message", &n.log.message)
            .field("timestamp", &n.log.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
            .field_opt("tag", n.log.tag.as_deref());
        SnapHash(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn log() -> LogEntry {
        LogEntry {
            author: Some("nadia".to_string()),
            email: Some("nadia@example.com".to_string()),
            message: "initial".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("valid time"),
            tag: None,
        }
    }

    fn record(id: &str, version: &str) -> DependencyRecord {
        DependencyRecord { id: id.to_string(), version: version.to_string() }
    }

    fn file(path: &str, hash: &str) -> FileRecord {
        FileRecord { path: path.to_string(), hash: FileHash(hash.to_string()) }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            files: vec![file("src/index.ts", "aa"), file("README.md", "bb")],
            dependencies: vec![record("lodash", "4.17.21"), record("acme/ui/button", "1.0.0")],
            dev_dependencies: vec![record("jest", "29.0.0")],
            peer_dependencies: Vec::new(),
            overrides: [("dependencies".to_string(), json!({"lodash": "4.17.21"}))]
                .into_iter()
                .collect(),
            log: log(),
        }
    }

    #[test]
    fn hash_ignores_collection_order() {
        let a = snapshot();
        let mut b = snapshot();
        b.files.reverse();
        b.dependencies.reverse();
        assert_eq!(a.snap_hash(), b.snap_hash());
    }

    #[test]
    fn hash_tracks_every_field() {
        let base = snapshot().snap_hash();

        let mut changed = snapshot();
        changed.files[0].hash = FileHash("cc".to_string());
        assert_ne!(base, changed.snap_hash());

        let mut changed = snapshot();
        changed.dependencies[0].version = "5.0.0".to_string();
        assert_ne!(base, changed.snap_hash());

        let mut changed = snapshot();
        changed.overrides.insert("env", json!("node"));
        assert_ne!(base, changed.snap_hash());

        let mut changed = snapshot();
        changed.log.message = "different".to_string();
        assert_ne!(base, changed.snap_hash());
    }

    #[test]
    fn finds_record_ignoring_version() {
        let snap = snapshot();
        let record = snap.find_record_ignoring_version("acme/ui/button@9.9.9");
        assert_eq!(record.map(|r| r.version.as_str()), Some("1.0.0"));
        assert!(snap.find_record_ignoring_version("acme/ui/card").is_none());
    }

    #[test]
    fn serializes_camel_case_and_round_trips() {
        let snap = snapshot().normalized();
        let text = serde_json::to_string(&snap).expect("serialize");
        assert!(text.contains("devDependencies"));
        let back: Snapshot = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, snap);
        assert_eq!(back.snap_hash(), snap.snap_hash());
    }
}
