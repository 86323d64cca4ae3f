//! # mosaic-workspace
//!
//! The working set over a scope:
//! - `Manifest` (tracked components, single writer, reason-labeled flushes)
//! - `WorkspaceConfig` rules plus `Extension` callbacks, merged into each
//!   component's effective config by `resolve_overrides`
//! - `ComponentLoader` (the only constructor of `Component`, explicit cache)
//! - dependency policy operations (`set` / `remove` / `reset` / `eject`,
//!   usage queries, provenance debug)
//! - modification detection against the last snapshot, and `blame` over
//!   a component's history
//!
//! `Workspace` fronts all of it; batches are sequenced by the caller and
//! every mutating operation flushes the manifest exactly once.

pub mod blame;
pub mod config;
pub mod error;
pub mod extensions;
pub mod loader;
pub mod manifest;
pub mod pattern;
pub mod pm;
pub mod policy;
pub mod reader;
pub mod resolve;
pub mod status;
pub mod workspace;

pub use blame::{BlameEntry, REMOVED_VERSION, UNKNOWN_AUTHOR};
pub use config::{ConfigError, OverrideRule, WORKSPACE_CONFIG_FILE, WorkspaceConfig};
pub use error::WorkspaceError;
pub use extensions::{Extension, ExtensionRegistry, OverridesContext};
pub use loader::{
    ComponentLoader, DEPS_DATA_KEY, ENVS_DATA_KEY, LoadContext, LoadManyResult, LoadOptions,
};
pub use manifest::{
    MANIFEST_DIR, MANIFEST_FILE, Manifest, ManifestEntry, ManifestError, NextVersion,
};
pub use pattern::{IdPattern, PatternError};
pub use pm::{NoPackageManager, PackageManager, PackageVersionResolver, StaticVersionResolver};
pub use policy::{DepsDebugResult, RemoveResult, SetResult};
pub use reader::{COMPONENT_CONFIG_FILE, ComponentReader, ComponentSource, FsReader, MemoryReader};
pub use resolve::{ResolvedOverrides, resolve_overrides, resolve_version};
pub use status::{is_modified, is_source_modified};
pub use workspace::{SCOPE_DIR, SnapResult, StatusReport, Workspace};
