//! Component loading and the load cache.
//!
//! The loader is the only constructor of `Component` values. It owns the
//! cache and borrows everything else per call, so the workspace can lend
//! out its parts without tying the loader to their lifetimes. Cache
//! entries are invalidated explicitly, never by expiry.

use crate::config::WorkspaceConfig;
use crate::error::WorkspaceError;
use crate::extensions::{ExtensionRegistry, OverridesContext};
use crate::manifest::{Manifest, ManifestEntry};
use crate::reader::ComponentReader;
use crate::resolve::{ResolvedOverrides, resolve_overrides, resolve_version};
use mosaic_model::{
    Component, ComponentId, ComponentIssue, Dependency, DependencyKind, DependencyList,
    DependencySource, OverrideSet, SnapHash, Snapshot, SourceFile, TOMBSTONE, VersionRef,
};
use mosaic_scope::{ComponentHistory, DEFAULT_LANE, ObjectStore};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Extension-data key of the builtin dependency record.
pub const DEPS_DATA_KEY: &str = "mosaic.deps";
/// Extension-data key of the builtin environment record.
pub const ENVS_DATA_KEY: &str = "mosaic.envs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Run the on-load pipeline (builtin data plus registered callbacks).
    /// Part of the cache key.
    pub load_extensions: bool,
    /// Consult the cache before loading. Not part of the cache key.
    pub use_cache: bool,
    /// Keep the loaded component in the cache. Not part of the cache key.
    pub store_in_cache: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions { load_extensions: true, use_cache: true, store_in_cache: true }
    }
}

impl LoadOptions {
    /// Normalized form suffixed onto the cache key. Only fields that
    /// change the loaded value participate.
    fn cache_suffix(&self) -> String {
        json!({ "loadExtensions": self.load_extensions }).to_string()
    }
}

/// Borrowed collaborators of one load call.
pub struct LoadContext<'a> {
    pub manifest: &'a Manifest,
    pub store: &'a dyn ObjectStore,
    pub reader: &'a dyn ComponentReader,
    pub config: &'a WorkspaceConfig,
    pub registry: &'a ExtensionRegistry,
}

/// Batch outcome: loaded components plus the per-id failures the batch
/// absorbed instead of aborting.
#[derive(Debug, Default)]
pub struct LoadManyResult {
    pub components: Vec<Arc<Component>>,
    pub invalid: Vec<(ComponentId, WorkspaceError)>,
    pub missing: Vec<(ComponentId, WorkspaceError)>,
}

#[derive(Debug, Default)]
pub struct ComponentLoader {
    cache: BTreeMap<String, Arc<Component>>,
}

impl ComponentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one component, preferring the cache. A cache hit must carry
    /// the exact resolved identifier: two ids can stringify identically
    /// while differing structurally, so the key alone does not decide.
    pub fn get(
        &mut self,
        ctx: &LoadContext<'_>,
        id: &ComponentId,
        opts: &LoadOptions,
    ) -> Result<Arc<Component>, WorkspaceError> {
        let resolved = resolve_version(ctx.manifest, id);
        let key = format!("{resolved}:{}", opts.cache_suffix());
        if opts.use_cache
            && let Some(cached) = self.cache.get(&key)
            && cached.id == resolved
        {
            return Ok(Arc::clone(cached));
        }
        let component = Arc::new(Self::load(ctx, &resolved, opts)?);
        if opts.store_in_cache {
            self.cache.insert(key, Arc::clone(&component));
        }
        Ok(component)
    }

    /// `get`, with "not found" mapped to `None`.
    pub fn get_if_exists(
        &mut self,
        ctx: &LoadContext<'_>,
        id: &ComponentId,
        opts: &LoadOptions,
    ) -> Result<Option<Arc<Component>>, WorkspaceError> {
        match self.get(ctx, id, opts) {
            Ok(component) => Ok(Some(component)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Load a batch strictly in order. Invalid and missing components are
    /// collected and the batch continues; any other failure aborts it.
    /// With `throw_on_failure` every failure aborts immediately.
    pub fn get_many(
        &mut self,
        ctx: &LoadContext<'_>,
        ids: &[ComponentId],
        opts: &LoadOptions,
        throw_on_failure: bool,
    ) -> Result<LoadManyResult, WorkspaceError> {
        let mut result = LoadManyResult::default();
        for id in ids {
            match self.get(ctx, id, opts) {
                Ok(component) => result.components.push(component),
                Err(err) if throw_on_failure => return Err(err),
                Err(err) if err.is_invalid_component() => {
                    warn!(id = %id, error = %err, "skipping invalid component");
                    result.invalid.push((id.clone(), err));
                }
                Err(err) if err.is_not_found() => {
                    warn!(id = %id, error = %err, "skipping missing component");
                    result.missing.push((id.clone(), err));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(result)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Drop the bare key and every option-suffixed variant of this id, so
    /// no stale variant survives a targeted invalidation.
    pub fn clear_component_cache(&mut self, id: &ComponentId) {
        let base = id.to_string();
        let prefix = format!("{base}:");
        self.cache.retain(|key, _| key != &base && !key.starts_with(&prefix));
        debug!(id = %base, "cleared cached component variants");
    }

    fn load(
        ctx: &LoadContext<'_>,
        resolved: &ComponentId,
        opts: &LoadOptions,
    ) -> Result<Component, WorkspaceError> {
        match ctx.manifest.find(resolved) {
            Some(entry) if entry.removed => {
                if resolved.has_version() {
                    let mut component = Self::load_from_scope(ctx, resolved)?;
                    component.removed = true;
                    Ok(component)
                } else {
                    Err(WorkspaceError::not_found(format!("removed component `{resolved}`")))
                }
            }
            Some(entry) => {
                let is_working_copy = match (&resolved.version, &entry.version) {
                    (None, None) => true,
                    (Some(requested), Some(current)) => requested == current,
                    _ => false,
                };
                if is_working_copy {
                    Self::load_working_copy(ctx, entry, resolved, opts)
                } else {
                    Self::load_from_scope(ctx, resolved)
                }
            }
            None => Self::load_from_scope(ctx, resolved),
        }
    }

    /// Load the checked-out state: files and config from the working
    /// directory, overrides resolved against rules and extensions.
    fn load_working_copy(
        ctx: &LoadContext<'_>,
        entry: &ManifestEntry,
        resolved: &ComponentId,
        opts: &LoadOptions,
    ) -> Result<Component, WorkspaceError> {
        let source = ctx.reader.read(&entry.location)?;
        let mut issues: Vec<ComponentIssue> = Vec::new();

        // Config set through the manifest (policy operations) wins over
        // the config file in the component directory.
        let local_config = match (&entry.config, &source.local_config) {
            (Some(from_entry), Some(from_file)) => {
                let (merged, merge_issues) = OverrideSet::merge(from_entry, from_file);
                issues.extend(merge_issues.into_iter().map(ComponentIssue::from));
                Some(merged)
            }
            (Some(from_entry), None) => Some(from_entry.clone()),
            (None, Some(from_file)) => Some(from_file.clone()),
            (None, None) => None,
        };

        let overrides_ctx = OverridesContext {
            id: resolved,
            files: &source.files,
            local_config: local_config.as_ref(),
        };
        let ResolvedOverrides { effective, extension_part, issues: resolve_issues, .. } =
            resolve_overrides(ctx.config, ctx.registry, &overrides_ctx);
        issues.extend(resolve_issues);

        let mut deps = Vec::new();
        for kind in DependencyKind::ALL {
            let Some(field) = effective.dependency_field(kind) else { continue };
            for (name, spec) in field {
                // non-string specs were already reported as merge issues
                let Some(version) = spec.as_str() else { continue };
                if version == TOMBSTONE {
                    continue;
                }
                let source_level = if local_config
                    .as_ref()
                    .is_some_and(|set| names_dependency(set, kind, name))
                {
                    DependencySource::Policy
                } else if names_dependency(&extension_part, kind, name) {
                    DependencySource::Extension
                } else {
                    DependencySource::WorkspaceRule
                };
                deps.push(Dependency::new(name.clone(), version, kind, source_level));
            }
        }

        let from_snapshot = match &entry.version {
            Some(version) => match snapshot_for(ctx.store, resolved, version) {
                Ok(snapshot) => Some(snapshot),
                Err(err) if err.is_not_found() => {
                    warn!(id = %resolved, error = %err, "manifest version missing from the scope");
                    None
                }
                Err(err) => return Err(err),
            },
            None => None,
        };

        let mut component = Component::new(resolved.clone(), source.files);
        component.local_config = local_config;
        component.config = effective;
        component.dependencies = DependencyList::new(deps);
        component.from_snapshot = from_snapshot;
        component.issues = issues;

        if opts.load_extensions {
            Self::run_load_pipeline(ctx, &mut component)?;
        }
        debug!(id = %component.id, files = component.files.len(), "loaded working copy");
        Ok(component)
    }

    /// Reconstruct a component from a snapshot in the scope. File
    /// contents come from blobs; the snapshot's overrides are the
    /// effective config as of that version. No callbacks run.
    fn load_from_scope(
        ctx: &LoadContext<'_>,
        resolved: &ComponentId,
    ) -> Result<Component, WorkspaceError> {
        let history = ctx.store.get_history(resolved)?;
        let id_str = resolved.to_string_no_version();
        let hash = match &resolved.version {
            Some(version) => history.resolve(&id_str, version)?,
            None => {
                let lane = ctx.manifest.lane().unwrap_or(DEFAULT_LANE);
                history.head(lane).cloned().ok_or_else(|| {
                    WorkspaceError::not_found(format!("component `{id_str}` on lane `{lane}`"))
                })?
            }
        };
        let snapshot = ctx.store.get_snapshot(&hash)?;

        let mut files = Vec::with_capacity(snapshot.files.len());
        for record in &snapshot.files {
            let content = ctx.store.get_file(&record.hash)?;
            files.push(SourceFile::new(record.path.clone(), content));
        }

        let mut deps = Vec::new();
        for kind in DependencyKind::ALL {
            for record in snapshot.dependencies_of_kind(kind) {
                deps.push(Dependency::new(
                    record.id.clone(),
                    record.version.clone(),
                    kind,
                    DependencySource::Policy,
                ));
            }
        }

        let id = if resolved.has_version() {
            resolved.clone()
        } else {
            resolved.with_version(version_of(&history, &hash))
        };
        let mut component = Component::new(id, files);
        component.config = snapshot.overrides.clone();
        component.dependencies = DependencyList::new(deps);
        component.from_snapshot = Some(snapshot);
        debug!(id = %component.id, hash = %hash, "loaded from scope");
        Ok(component)
    }

    /// Builtin extension data first, then every registered callback in
    /// registration order: later callbacks may read what earlier ones
    /// recorded.
    fn run_load_pipeline(
        ctx: &LoadContext<'_>,
        component: &mut Component,
    ) -> Result<(), WorkspaceError> {
        let deps_data = json!({
            "packageName": component.package_name(),
            "dependencies": &component.dependencies,
            "policy": {
                "dependencies": component.config.get("dependencies"),
                "devDependencies": component.config.get("devDependencies"),
                "peerDependencies": component.config.get("peerDependencies"),
            },
        });
        component.upsert_extension_data(DEPS_DATA_KEY, deps_data);

        if let Some(env) = component.env().map(str::to_string) {
            component.upsert_extension_data(ENVS_DATA_KEY, json!({ "env": env }));
        }

        for extension in ctx.registry.iter() {
            let Some(hook) = extension.on_load_hook() else { continue };
            match hook(component) {
                Ok(Some(data)) => component.upsert_extension_data(extension.name(), data),
                Ok(None) => {}
                Err(reason) => {
                    return Err(WorkspaceError::invalid_component(
                        &component.id,
                        format!("extension `{}` failed during load: {reason}", extension.name()),
                    ));
                }
            }
        }

        let mut envs = BTreeSet::new();
        if let Some(env) = component.env() {
            envs.insert(env.to_string());
        }
        for data in component.extension_data.values() {
            if let Some(env) = data.get("env").and_then(Value::as_str) {
                envs.insert(env.to_string());
            }
        }
        if envs.len() > 1 {
            component
                .issues
                .push(ComponentIssue::MultipleEnvs { envs: envs.into_iter().collect() });
        }
        Ok(())
    }
}

fn names_dependency(set: &OverrideSet, kind: DependencyKind, name: &str) -> bool {
    set.dependency_field(kind).is_some_and(|field| field.contains_key(name))
}

fn snapshot_for(
    store: &dyn ObjectStore,
    id: &ComponentId,
    version: &VersionRef,
) -> Result<Snapshot, WorkspaceError> {
    let hash = store.resolve_version(id, version)?;
    Ok(store.get_snapshot(&hash)?)
}

/// The caller-facing version of a snapshot: its tag when one points at
/// it, the raw hash otherwise.
fn version_of(history: &ComponentHistory, hash: &SnapHash) -> VersionRef {
    history
        .tags
        .iter()
        .find(|(_, tagged)| *tagged == hash)
        .map(|(tag, _)| VersionRef::Tag(tag.clone()))
        .unwrap_or_else(|| VersionRef::Snap(hash.clone()))
}
