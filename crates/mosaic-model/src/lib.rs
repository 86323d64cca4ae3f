//! # mosaic-model
//!
//! The pure data model for versioned components:
//! - `ComponentId` / `VersionRef` (typed identifiers, `[scope/]name[@version]`)
//! - `PackageSpec` (`name[@version]` requests, scoped names included)
//! - `OverrideSet` and its merge algebra (precedence-aware, tombstones)
//! - `Snapshot` (immutable, content-addressed, mandatory normalization)
//! - `Component` (a loaded working copy with per-extension data)
//!
//! This crate is I/O-free. Persistence lives in `mosaic-scope`;
//! resolution and loading live in `mosaic-workspace`.

pub mod component;
pub mod dependency;
pub mod hash;
pub mod id;
pub mod issue;
pub mod overrides;
pub mod pkg;
pub mod snapshot;
pub mod source;

pub use component::Component;
pub use dependency::{
    Dependency, DependencyKind, DependencyList, DependencySource, is_component_id,
};
pub use hash::{FileHash, HashBuilder, SnapHash, is_hash_shaped, sha256_hex};
pub use id::{ComponentId, IdError, VersionRef};
pub use issue::ComponentIssue;
pub use overrides::{
    FieldMergeIssue, OverrideSet, TOMBSTONE, deep_merge_left, internal_fields,
};
pub use pkg::{LATEST, PackageSpec, SpecError, strip_version_suffix};
pub use snapshot::{DependencyRecord, FileRecord, LogEntry, Snapshot};
pub use source::SourceFile;
