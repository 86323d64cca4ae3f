//! The workspace façade: one owner for the manifest, config, store,
//! reader, registry, and loader.
//!
//! All mutation funnels through `&mut self`, so the manifest has exactly
//! one writer. Every mutating operation ends with a single labeled
//! manifest flush.

use crate::config::{WORKSPACE_CONFIG_FILE, WorkspaceConfig};
use crate::error::WorkspaceError;
use crate::extensions::{Extension, ExtensionRegistry};
use crate::loader::{ComponentLoader, LoadContext, LoadManyResult, LoadOptions};
use crate::manifest::{MANIFEST_DIR, MANIFEST_FILE, Manifest, ManifestEntry, NextVersion};
use crate::pattern::IdPattern;
use crate::pm::{NoPackageManager, PackageManager, PackageVersionResolver, StaticVersionResolver};
use crate::reader::{ComponentReader, FsReader};
use crate::resolve::resolve_version;
use crate::status::{is_modified, is_source_modified};
use chrono::Utc;
use mosaic_model::{
    Component, ComponentId, ComponentIssue, LogEntry, SnapHash, Snapshot, VersionRef,
};
use mosaic_scope::{DEFAULT_LANE, FsStore, ObjectStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Scope directory inside `.mosaic`.
pub const SCOPE_DIR: &str = "scope";

/// What one snapped component produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapResult {
    pub id: String,
    pub hash: SnapHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub id: String,
    /// Tracked but never snapped.
    pub new: bool,
    pub modified: bool,
    pub source_modified: bool,
    pub removed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ComponentIssue>,
}

pub struct Workspace {
    pub(crate) root: PathBuf,
    pub(crate) manifest: Manifest,
    pub(crate) config: WorkspaceConfig,
    pub(crate) store: Box<dyn ObjectStore>,
    pub(crate) reader: Box<dyn ComponentReader>,
    pub(crate) registry: ExtensionRegistry,
    pub(crate) loader: ComponentLoader,
    pub(crate) version_resolver: Box<dyn PackageVersionResolver>,
    pub(crate) package_manager: Box<dyn PackageManager>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace").field("root", &self.root).finish_non_exhaustive()
    }
}

impl Workspace {
    /// Wire a workspace from parts. `open` and `discover` are the
    /// filesystem-backed front doors; this one is for embedders and
    /// tests that bring their own store or reader.
    pub fn new(
        root: impl Into<PathBuf>,
        manifest: Manifest,
        config: WorkspaceConfig,
        store: Box<dyn ObjectStore>,
        reader: Box<dyn ComponentReader>,
    ) -> Self {
        Workspace {
            root: root.into(),
            manifest,
            config,
            store,
            reader,
            registry: ExtensionRegistry::new(),
            loader: ComponentLoader::new(),
            version_resolver: Box::new(StaticVersionResolver::new()),
            package_manager: Box::new(NoPackageManager),
        }
    }

    /// Open the workspace rooted exactly at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();
        let manifest_path = root.join(MANIFEST_DIR).join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(WorkspaceError::OutsideContext);
        }
        let manifest = Manifest::load(manifest_path)?;
        let config = WorkspaceConfig::load(root.join(WORKSPACE_CONFIG_FILE))?;
        let store = FsStore::new(root.join(MANIFEST_DIR).join(SCOPE_DIR));
        let reader = FsReader::new(&root);
        Ok(Workspace::new(root, manifest, config, Box::new(store), Box::new(reader)))
    }

    /// Walk up from `start` to the nearest directory holding a manifest.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        let mut dir = Some(start.as_ref());
        while let Some(current) = dir {
            if current.join(MANIFEST_DIR).join(MANIFEST_FILE).is_file() {
                return Self::open(current);
            }
            dir = current.parent();
        }
        Err(WorkspaceError::OutsideContext)
    }

    /// Create an empty workspace at `root` (idempotent: an existing one
    /// is opened instead).
    pub fn init(root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();
        let manifest_path = root.join(MANIFEST_DIR).join(MANIFEST_FILE);
        if manifest_path.is_file() {
            return Self::open(root);
        }
        let mut manifest = Manifest::new(&manifest_path);
        manifest.mark_changed();
        manifest.write("init")?;
        Self::open(root)
    }

    pub fn with_version_resolver(mut self, resolver: Box<dyn PackageVersionResolver>) -> Self {
        self.version_resolver = resolver;
        self
    }

    pub fn with_package_manager(mut self, pm: Box<dyn PackageManager>) -> Self {
        self.package_manager = pm;
        self
    }

    /// Register an extension. Existing cache entries were resolved
    /// without it, so the cache is dropped wholesale.
    pub fn register_extension(&mut self, extension: Extension) {
        self.registry.register(extension);
        self.loader.clear_cache();
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn lane(&self) -> &str {
        self.manifest.lane().unwrap_or(DEFAULT_LANE)
    }

    pub fn list_ids(&self, include_removed: bool) -> Vec<ComponentId> {
        self.manifest.list_ids(include_removed)
    }

    pub fn get(&mut self, id: &ComponentId) -> Result<Arc<Component>, WorkspaceError> {
        self.load(id, &LoadOptions::default())
    }

    pub fn get_with_options(
        &mut self,
        id: &ComponentId,
        opts: &LoadOptions,
    ) -> Result<Arc<Component>, WorkspaceError> {
        self.load(id, opts)
    }

    pub fn get_if_exists(
        &mut self,
        id: &ComponentId,
    ) -> Result<Option<Arc<Component>>, WorkspaceError> {
        let ctx = LoadContext {
            manifest: &self.manifest,
            store: self.store.as_ref(),
            reader: self.reader.as_ref(),
            config: &self.config,
            registry: &self.registry,
        };
        self.loader.get_if_exists(&ctx, id, &LoadOptions::default())
    }

    pub fn get_many(
        &mut self,
        ids: &[ComponentId],
        throw_on_failure: bool,
    ) -> Result<LoadManyResult, WorkspaceError> {
        self.load_many(ids, &LoadOptions::default(), throw_on_failure)
    }

    pub(crate) fn load(
        &mut self,
        id: &ComponentId,
        opts: &LoadOptions,
    ) -> Result<Arc<Component>, WorkspaceError> {
        let ctx = LoadContext {
            manifest: &self.manifest,
            store: self.store.as_ref(),
            reader: self.reader.as_ref(),
            config: &self.config,
            registry: &self.registry,
        };
        self.loader.get(&ctx, id, opts)
    }

    pub(crate) fn load_many(
        &mut self,
        ids: &[ComponentId],
        opts: &LoadOptions,
        throw_on_failure: bool,
    ) -> Result<LoadManyResult, WorkspaceError> {
        let ctx = LoadContext {
            manifest: &self.manifest,
            store: self.store.as_ref(),
            reader: self.reader.as_ref(),
            config: &self.config,
            registry: &self.registry,
        };
        self.loader.get_many(&ctx, ids, opts, throw_on_failure)
    }

    /// Expand a comma-separated glob pattern against the tracked,
    /// non-removed components. Matching nothing is an error: silently
    /// operating on an empty set hides typos.
    pub fn resolve_pattern(&self, pattern: &str) -> Result<Vec<ComponentId>, WorkspaceError> {
        let compiled = IdPattern::parse(pattern).map_err(|e| WorkspaceError::InvalidPattern {
            pattern: e.pattern,
            reason: e.reason,
        })?;
        let matches: Vec<ComponentId> =
            self.manifest.list_ids(false).into_iter().filter(|id| compiled.matches(id)).collect();
        if matches.is_empty() {
            return Err(WorkspaceError::not_found(format!("components matching `{pattern}`")));
        }
        Ok(matches)
    }

    /// Parse an id string and canonicalize it against the manifest, so
    /// an unscoped name picks up its tracked scope.
    pub fn resolve_id(&self, id: &str) -> Result<ComponentId, WorkspaceError> {
        let parsed = ComponentId::parse(id)?;
        match self.manifest.find(&parsed) {
            Some(entry) => Ok(match &parsed.version {
                Some(version) => entry.id.with_version(version.clone()),
                None => entry.id.clone(),
            }),
            None => Ok(parsed),
        }
    }

    /// Start tracking a component directory. An unscoped id takes the
    /// workspace default scope.
    pub fn track(
        &mut self,
        id: ComponentId,
        location: impl Into<String>,
    ) -> Result<ComponentId, WorkspaceError> {
        let id = match (&id.scope, &self.config.default_scope) {
            (None, Some(scope)) => ComponentId::new(Some(scope.clone()), id.name.clone()),
            _ => id.without_version(),
        };
        self.manifest.upsert(ManifestEntry::new(id.clone(), location));
        self.manifest.write(&format!("track ({id})"))?;
        self.loader.clear_component_cache(&id);
        Ok(id)
    }

    /// Remove matched components: soft by default (kept in the manifest,
    /// skipped by listings and load callbacks), hard on request.
    pub fn remove(
        &mut self,
        pattern: &str,
        hard: bool,
    ) -> Result<Vec<ComponentId>, WorkspaceError> {
        let ids = self.resolve_pattern(pattern)?;
        let resolved: Vec<ComponentId> =
            ids.iter().map(|id| resolve_version(&self.manifest, id)).collect();
        let keys: Vec<String> = ids.iter().filter_map(|id| self.manifest.find_key(id)).collect();
        if hard {
            self.manifest.remove_entries(&keys);
        } else {
            for key in &keys {
                self.manifest.mark_removed(key);
            }
        }
        self.manifest.write(&format!("remove ({pattern})"))?;
        for id in ids.iter().chain(resolved.iter()) {
            self.loader.clear_component_cache(id);
        }
        Ok(ids)
    }

    /// Record pending-version metadata consumed by the next `snap`.
    pub fn set_next_version(
        &mut self,
        pattern: &str,
        version: &str,
        message: Option<&str>,
    ) -> Result<Vec<ComponentId>, WorkspaceError> {
        let ids = self.resolve_pattern(pattern)?;
        for id in &ids {
            if let Some(key) = self.manifest.find_key(id) {
                self.manifest.set_next_version(
                    &key,
                    NextVersion {
                        version: version.to_string(),
                        message: message.map(str::to_string),
                        username: None,
                        email: None,
                    },
                );
            }
        }
        self.manifest.write(&format!("set-next-version ({pattern})"))?;
        Ok(ids)
    }

    /// Snapshot every matched component that changed since its last
    /// snapshot (or that is explicitly tagged). Pending-version metadata
    /// fills whatever the arguments leave unset, then clears.
    pub fn snap(
        &mut self,
        pattern: &str,
        message: &str,
        author: Option<&str>,
        email: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Vec<SnapResult>, WorkspaceError> {
        let ids = self.resolve_pattern(pattern)?;
        let mut results = Vec::new();
        for id in &ids {
            let Some(key) = self.manifest.find_key(id) else { continue };
            let next = self.manifest.get(&key).and_then(|entry| entry.next_version.clone());
            let component = self.load(id, &LoadOptions::default())?;

            let effective_tag =
                tag.map(str::to_string).or_else(|| next.as_ref().map(|n| n.version.clone()));
            if effective_tag.is_none()
                && let Some(model) = &component.from_snapshot
                && !is_modified(model, &component)
            {
                debug!(id = %component.id, "unchanged since last snapshot, skipping");
                continue;
            }

            let log = LogEntry {
                author: author
                    .map(str::to_string)
                    .or_else(|| next.as_ref().and_then(|n| n.username.clone())),
                email: email
                    .map(str::to_string)
                    .or_else(|| next.as_ref().and_then(|n| n.email.clone())),
                message: match next.as_ref().and_then(|n| n.message.clone()) {
                    Some(pending) if message.is_empty() => pending,
                    _ => message.to_string(),
                },
                timestamp: Utc::now(),
                tag: effective_tag.clone(),
            };
            let snapshot = Snapshot::from_component(&component, log);
            let lane = self.lane().to_string();
            let hash = self.store.put_snapshot(&component.id, &snapshot, &component.files, &lane)?;

            let version = match &effective_tag {
                Some(tag) => VersionRef::Tag(tag.clone()),
                None => VersionRef::Snap(hash.clone()),
            };
            self.manifest.set_version(&key, version);
            self.manifest.clear_next_version(&key);
            self.loader.clear_component_cache(&component.id);
            self.loader.clear_component_cache(id);

            results.push(SnapResult {
                id: component.id.to_string_no_version(),
                hash,
                tag: effective_tag,
            });
        }
        self.manifest.write(&format!("snap ({pattern})"))?;
        Ok(results)
    }

    /// Modification report for one component.
    pub fn status(&mut self, id: &ComponentId) -> Result<StatusReport, WorkspaceError> {
        let component = self.get(id)?;
        let (new, modified, source_modified) = match &component.from_snapshot {
            Some(model) => {
                (false, is_modified(model, &component), is_source_modified(model, &component))
            }
            None => (true, false, false),
        };
        Ok(StatusReport {
            id: component.id.to_string(),
            new,
            modified,
            source_modified,
            removed: component.removed,
            issues: component.issues.clone(),
        })
    }
}
