//! Dependency policy operations over component patterns.
//!
//! Every operation is transactional per matched component: read the
//! current policy, compute the new one, stage it on the manifest entry,
//! and flush the manifest exactly once per batch, labeled
//! `<op> (<pattern>)`. Package specs parse up front, so a malformed spec
//! aborts before any entry is touched.

use crate::error::WorkspaceError;
use crate::loader::LoadOptions;
use crate::manifest::ManifestEntry;
use crate::resolve::resolve_version;
use crate::workspace::Workspace;
use mosaic_model::{
    ComponentId, ComponentIssue, DependencyKind, DependencyList, OverrideSet, PackageSpec,
    TOMBSTONE, is_component_id,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Outcome of a `set` batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResult {
    /// Matched component ids, without version.
    pub changed: Vec<String>,
    /// Package name to written version, after resolution.
    pub added: BTreeMap<String, String>,
}

/// What `remove` took away from one component.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResult {
    pub id: String,
    /// `name@version` of every removed dependency.
    pub removed: Vec<String>,
}

/// Resolved-dependency report for one component.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepsDebugResult {
    pub id: String,
    /// The resolved list, provenance included.
    pub dependencies: DependencyList,
    /// `name@spec` entries the component's own config added.
    pub manually_added: Vec<String>,
    /// Names the component's own config tombstoned.
    pub manually_removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ComponentIssue>,
}

impl Workspace {
    /// Write `name: version` entries into the policy of every component
    /// matching the pattern. A missing or `latest` version resolves
    /// through the version resolver. The fragment merges over each
    /// component's existing config, which in turn merges over its model
    /// snapshot's policy, so a `set` also materializes what the last
    /// snapshot pinned.
    pub fn set_dependency(
        &mut self,
        pattern: &str,
        packages: &[String],
        kind: DependencyKind,
    ) -> Result<SetResult, WorkspaceError> {
        let ids = self.resolve_pattern(pattern)?;
        let specs = PackageSpec::parse_all(packages)?;

        let mut added: BTreeMap<String, String> = BTreeMap::new();
        for spec in &specs {
            let version = match (&spec.version, spec.wants_latest()) {
                (Some(version), false) => version.clone(),
                _ => self.version_resolver.resolve_latest(&spec.name)?,
            };
            added.insert(spec.name.clone(), version);
        }
        let mut fragment = OverrideSet::new();
        fragment.insert(
            kind.field_name(),
            Value::Object(
                added
                    .iter()
                    .map(|(name, version)| (name.clone(), Value::String(version.clone())))
                    .collect::<Map<String, Value>>(),
            ),
        );

        let mut changed = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(entry) = self.manifest.find(id) else { continue };
            let key = entry.id.to_string_no_version();
            let existing = entry.config.clone().unwrap_or_default();
            let previous = self.model_policy(entry)?;
            let (base, _) = OverrideSet::merge(&existing, &previous);
            let (next, issues) = OverrideSet::merge(&fragment, &base);
            for issue in issues {
                warn!(id = %key, issue = %issue, "config merge issue during deps-set");
            }
            self.manifest.set_component_config(&key, Some(next));
            self.invalidate(id);
            changed.push(key);
        }
        self.manifest.write(&format!("deps-set ({pattern})"))?;
        Ok(SetResult { changed, added })
    }

    /// Remove dependencies from every matched component. A dependency in
    /// the component's own policy is deleted outright; an inherited one
    /// gets a tombstone so resolution skips it, unless
    /// `remove_only_if_exists` restricts removal to own entries.
    /// Components with zero removals are excluded from the result and
    /// never written.
    pub fn remove_dependency(
        &mut self,
        pattern: &str,
        packages: &[String],
        kind_hint: Option<DependencyKind>,
        remove_only_if_exists: bool,
    ) -> Result<Vec<RemoveResult>, WorkspaceError> {
        let ids = self.resolve_pattern(pattern)?;
        let specs = PackageSpec::parse_all(packages)?;

        let mut results = Vec::new();
        for id in &ids {
            let component = match self.load(id, &LoadOptions::default()) {
                Ok(component) => component,
                Err(err) if err.is_recoverable() => {
                    warn!(id = %id, error = %err, "skipping component during deps-remove");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let Some(entry) = self.manifest.find(id) else { continue };
            let key = entry.id.to_string_no_version();
            // Without own config, start from the model snapshot's policy:
            // deleting an entry found there must land as explicit config.
            let mut config = match &entry.config {
                Some(config) => config.clone(),
                None => self.model_policy(entry)?,
            };

            let mut removed = Vec::new();
            for spec in &specs {
                let Some(dependency) =
                    component.dependencies.find_by_name_or_id(&spec.name, spec.version.as_deref())
                else {
                    continue;
                };
                let kind = kind_hint.unwrap_or(dependency.kind);
                let own_spec = config
                    .dependency_field(kind)
                    .and_then(|field| field.get(&dependency.name))
                    .cloned();
                match own_spec {
                    Some(value) if value == TOMBSTONE => continue,
                    Some(_) => {
                        config.dependency_field_mut(kind).remove(&dependency.name);
                    }
                    None if remove_only_if_exists => continue,
                    None => {
                        config
                            .dependency_field_mut(kind)
                            .insert(dependency.name.clone(), Value::String(TOMBSTONE.to_string()));
                    }
                }
                removed.push(format!("{}@{}", dependency.name, dependency.version));
            }
            if removed.is_empty() {
                continue;
            }
            self.manifest.set_component_config(&key, Some(config));
            self.invalidate(id);
            results.push(RemoveResult { id: key, removed });
        }
        self.manifest.write(&format!("deps-remove ({pattern})"))?;
        Ok(results)
    }

    /// Drop the three dependency fields from each matched component's
    /// config, leaving whatever else it carries alone.
    pub fn reset_dependencies(
        &mut self,
        pattern: &str,
    ) -> Result<Vec<ComponentId>, WorkspaceError> {
        let ids = self.resolve_pattern(pattern)?;
        for id in &ids {
            let Some(entry) = self.manifest.find(id) else { continue };
            let key = entry.id.to_string_no_version();
            let mut config = entry.config.clone().unwrap_or_default();
            for kind in DependencyKind::ALL {
                config.remove(kind.field_name());
            }
            self.manifest.set_component_config(&key, Some(config));
            self.invalidate(id);
        }
        self.manifest.write(&format!("deps-reset ({pattern})"))?;
        Ok(ids)
    }

    /// Materialize the effective dependency policy into each matched
    /// component's own config. Inherited entries become explicit and stop
    /// following upstream changes.
    pub fn eject_dependencies(
        &mut self,
        pattern: &str,
    ) -> Result<Vec<ComponentId>, WorkspaceError> {
        let ids = self.resolve_pattern(pattern)?;
        for id in &ids {
            let component = match self.load(id, &LoadOptions::default()) {
                Ok(component) => component,
                Err(err) if err.is_recoverable() => {
                    warn!(id = %id, error = %err, "skipping component during deps-eject");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let Some(entry) = self.manifest.find(id) else { continue };
            let key = entry.id.to_string_no_version();
            let existing = entry.config.clone().unwrap_or_default();
            let previous = self.model_policy(entry)?;
            let effective = policy_fields(&component.config);
            let (inherited, _) = OverrideSet::merge(&effective, &previous);
            let (next, issues) = OverrideSet::merge(&existing, &inherited);
            for issue in issues {
                warn!(id = %key, issue = %issue, "config merge issue during deps-eject");
            }
            self.manifest.set_component_config(&key, Some(next));
            self.invalidate(id);
        }
        self.manifest.write(&format!("deps-eject ({pattern})"))?;
        Ok(ids)
    }

    /// Everywhere a package or component appears as a dependency:
    /// component id string to resolved version. An explicit `@version`
    /// suffix narrows the match.
    pub fn usage(&mut self, dep: &str) -> Result<BTreeMap<String, String>, WorkspaceError> {
        let spec = PackageSpec::parse(dep)?;
        let ids = self.list_ids(false);
        let loaded = self.load_many(&ids, &LoadOptions::default(), false)?;
        let mut results = BTreeMap::new();
        for component in &loaded.components {
            let Some(found) =
                component.dependencies.find_by_name_or_id(&spec.name, spec.version.as_deref())
            else {
                continue;
            };
            results.insert(component.id.to_string(), found.version.clone());
        }
        Ok(results)
    }

    /// Deep usage chains, answered by the package manager for package
    /// names. Component ids have no deep answer here.
    pub fn usage_deep(&self, dep: &str) -> Result<Option<String>, WorkspaceError> {
        if is_component_id(dep) {
            return Ok(None);
        }
        self.package_manager.find_usages(dep)
    }

    /// Everything the resolver knows about one component's dependencies:
    /// the resolved list with provenance, what its own config added or
    /// tombstoned, and the issues the load attached.
    pub fn debug_dependencies(&mut self, id: &str) -> Result<DepsDebugResult, WorkspaceError> {
        let id = self.resolve_id(id)?;
        let component = self.get(&id)?;

        let mut manually_added = Vec::new();
        let mut manually_removed = Vec::new();
        if let Some(own) = &component.local_config {
            for kind in DependencyKind::ALL {
                let Some(field) = own.dependency_field(kind) else { continue };
                for (name, spec) in field {
                    match spec.as_str() {
                        Some(TOMBSTONE) => manually_removed.push(name.clone()),
                        Some(version) => manually_added.push(format!("{name}@{version}")),
                        None => {}
                    }
                }
            }
        }

        Ok(DepsDebugResult {
            id: component.id.to_string(),
            dependencies: component.dependencies.clone(),
            manually_added,
            manually_removed,
            issues: component.issues.clone(),
        })
    }

    /// The dependency fields of the entry's model snapshot, when the
    /// entry has a version the scope still holds.
    fn model_policy(&self, entry: &ManifestEntry) -> Result<OverrideSet, WorkspaceError> {
        let Some(version) = &entry.version else {
            return Ok(OverrideSet::new());
        };
        let snapshot = self
            .store
            .resolve_version(&entry.id, version)
            .and_then(|hash| self.store.get_snapshot(&hash));
        match snapshot {
            Ok(snapshot) => Ok(policy_fields(&snapshot.overrides)),
            Err(err) => {
                let err = WorkspaceError::from(err);
                if err.is_not_found() {
                    warn!(id = %entry.id, error = %err, "manifest version missing from the scope");
                    Ok(OverrideSet::new())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Drop the cached variants of both the bare and the resolved id:
    /// cache keys carry the resolved version, callers pass either form.
    fn invalidate(&mut self, id: &ComponentId) {
        let resolved = resolve_version(&self.manifest, id);
        self.loader.clear_component_cache(&resolved);
        if resolved != *id {
            self.loader.clear_component_cache(id);
        }
    }
}

/// The three dependency fields of a config, nothing else.
fn policy_fields(set: &OverrideSet) -> OverrideSet {
    let mut fields = OverrideSet::new();
    for kind in DependencyKind::ALL {
        if let Some(value) = set.get(kind.field_name()) {
            fields.insert(kind.field_name(), value.clone());
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OverrideRule, WorkspaceConfig};
    use crate::manifest::{MANIFEST_DIR, MANIFEST_FILE, Manifest};
    use crate::pm::{PackageManager, StaticVersionResolver};
    use crate::reader::MemoryReader;
    use mosaic_model::DependencySource;
    use mosaic_scope::MemoryStore;
    use serde_json::json;
    use std::path::Path;

    fn memory_workspace(dir: &Path) -> Workspace {
        let mut reader = MemoryReader::new();
        reader.insert(
            "components/button",
            vec![("index.ts".to_string(), b"export {};".to_vec())],
            None,
        );
        reader.insert(
            "components/card",
            vec![("index.ts".to_string(), b"export { card };".to_vec())],
            None,
        );
        let manifest = Manifest::new(dir.join(MANIFEST_DIR).join(MANIFEST_FILE));
        Workspace::new(
            dir,
            manifest,
            WorkspaceConfig::default(),
            Box::new(MemoryStore::new()),
            Box::new(reader),
        )
        .with_version_resolver(Box::new(StaticVersionResolver::new().with("lodash", "4.17.21")))
    }

    fn id(s: &str) -> ComponentId {
        ComponentId::parse(s).expect("valid id")
    }

    fn set_of(value: serde_json::Value) -> OverrideSet {
        let serde_json::Value::Object(map) = value else { panic!("object expected") };
        map.into_iter().collect()
    }

    fn rule(pattern: &str, overrides: serde_json::Value) -> OverrideRule {
        OverrideRule { pattern: pattern.to_string(), overrides: set_of(overrides) }
    }

    fn entry_config(ws: &Workspace, id_str: &str) -> OverrideSet {
        ws.manifest()
            .find(&id(id_str))
            .expect("entry")
            .config
            .clone()
            .expect("entry has config")
    }

    #[test]
    fn set_resolves_latest_and_lands_in_the_resolved_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        let before = ws.get(&id("acme/ui/button")).expect("load");
        assert!(before.dependencies.find_by_name_or_id("lodash", None).is_none());

        let result = ws
            .set_dependency("acme/ui/button", &["lodash".to_string()], DependencyKind::Runtime)
            .expect("set");
        assert_eq!(result.changed, vec!["acme/ui/button".to_string()]);
        assert_eq!(result.added.get("lodash").map(String::as_str), Some("4.17.21"));
        assert_eq!(
            entry_config(&ws, "acme/ui/button").get("dependencies"),
            Some(&json!({"lodash": "4.17.21"}))
        );

        // the cache was invalidated, so the fresh load sees the new policy
        let after = ws.get(&id("acme/ui/button")).expect("load");
        let dep = after.dependencies.find_by_name_or_id("lodash", None).expect("dep");
        assert_eq!(dep.version, "4.17.21");
        assert_eq!(dep.source, DependencySource::Policy);
    }

    #[test]
    fn set_merges_with_existing_config_and_model_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        let key = ws.manifest.find_key(&id("acme/ui/button")).expect("tracked");
        ws.manifest.set_component_config(&key, Some(set_of(json!({"env": "node"}))));

        ws.set_dependency("acme/ui/button", &["lodash@1.0.0".to_string()], DependencyKind::Runtime)
            .expect("set");
        ws.snap("acme/ui/button", "pin lodash", None, None, Some("1.0.0")).expect("snap");
        ws.reset_dependencies("acme/ui/button").expect("reset");
        assert_eq!(entry_config(&ws, "acme/ui/button").get("dependencies"), None);

        // previous = the snapshot's policy; it resurfaces under the new set
        ws.set_dependency("acme/ui/button", &["react@18.0.0".to_string()], DependencyKind::Runtime)
            .expect("set");
        let config = entry_config(&ws, "acme/ui/button");
        assert_eq!(
            config.get("dependencies"),
            Some(&json!({"lodash": "1.0.0", "react": "18.0.0"}))
        );
        assert_eq!(config.get("env"), Some(&json!("node")), "unrelated config keys survive");
    }

    #[test]
    fn set_overwrites_a_tombstone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        let key = ws.manifest.find_key(&id("acme/ui/button")).expect("tracked");
        ws.manifest.set_component_config(&key, Some(set_of(json!({"dependencies": {"lodash": "-"}}))));

        ws.set_dependency("acme/ui/button", &["lodash@2.0.0".to_string()], DependencyKind::Runtime)
            .expect("set");
        assert_eq!(
            entry_config(&ws, "acme/ui/button").get("dependencies"),
            Some(&json!({"lodash": "2.0.0"}))
        );
    }

    #[test]
    fn set_dev_flag_targets_the_dev_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.track(id("acme/ui/button"), "components/button").expect("track");

        ws.set_dependency("acme/ui/button", &["jest@29.0.0".to_string()], DependencyKind::Dev)
            .expect("set");
        let config = entry_config(&ws, "acme/ui/button");
        assert_eq!(config.get("devDependencies"), Some(&json!({"jest": "29.0.0"})));
        assert_eq!(config.get("dependencies"), None);
    }

    #[test]
    fn malformed_spec_aborts_before_any_mutation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        let manifest_path = ws.manifest().path().to_path_buf();
        let before = std::fs::read(&manifest_path).expect("manifest bytes");

        let err = ws
            .set_dependency("acme/ui/button", &["pkg@1@2".to_string()], DependencyKind::Runtime)
            .expect_err("malformed spec");
        assert!(matches!(err, WorkspaceError::MalformedSpec(_)));

        let after = std::fs::read(&manifest_path).expect("manifest bytes");
        assert_eq!(before, after, "a bad spec must not touch the manifest");
        assert!(ws.manifest().find(&id("acme/ui/button")).expect("entry").config.is_none());
    }

    #[test]
    fn set_on_unknown_pattern_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        let err = ws
            .set_dependency("nothing/*", &["lodash".to_string()], DependencyKind::Runtime)
            .expect_err("no match");
        assert!(err.is_not_found());
    }

    #[test]
    fn remove_deletes_own_entries_and_tombstones_inherited() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.config.rules = vec![rule("*", json!({"dependencies": {"inherited": "1.0.0"}}))];
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        ws.set_dependency("acme/ui/button", &["lodash@4.17.21".to_string()], DependencyKind::Runtime)
            .expect("set");

        let results = ws
            .remove_dependency(
                "acme/ui/button",
                &["lodash".to_string(), "inherited".to_string()],
                None,
                false,
            )
            .expect("remove");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "acme/ui/button");
        assert_eq!(results[0].removed, vec!["lodash@4.17.21", "inherited@1.0.0"]);

        let config = entry_config(&ws, "acme/ui/button");
        assert_eq!(config.get("dependencies"), Some(&json!({"inherited": "-"})));

        // the tombstone takes effect on the next load
        let component = ws.get(&id("acme/ui/button")).expect("load");
        assert!(component.dependencies.find_by_name_or_id("inherited", None).is_none());
        assert!(component.dependencies.find_by_name_or_id("lodash", None).is_none());
    }

    #[test]
    fn remove_on_a_tombstoned_name_reports_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.config.rules = vec![rule("*", json!({"dependencies": {"inherited": "1.0.0"}}))];
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        ws.remove_dependency("acme/ui/button", &["inherited".to_string()], None, false)
            .expect("first remove");

        // already tombstoned: the dependency no longer resolves, so the
        // second remove finds nothing and the component is excluded
        let results = ws
            .remove_dependency("acme/ui/button", &["inherited".to_string()], None, false)
            .expect("second remove");
        assert!(results.is_empty());
        assert_eq!(
            entry_config(&ws, "acme/ui/button").get("dependencies"),
            Some(&json!({"inherited": "-"}))
        );
    }

    #[test]
    fn remove_only_if_exists_spares_inherited_dependencies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.config.rules = vec![rule("*", json!({"dependencies": {"inherited": "1.0.0"}}))];
        ws.track(id("acme/ui/button"), "components/button").expect("track");

        let results = ws
            .remove_dependency("acme/ui/button", &["inherited".to_string()], None, true)
            .expect("remove");
        assert!(results.is_empty(), "inherited-only dependency is spared");
        assert!(ws.manifest().find(&id("acme/ui/button")).expect("entry").config.is_none());

        let component = ws.get(&id("acme/ui/button")).expect("load");
        assert!(component.dependencies.find_by_name_or_id("inherited", None).is_some());
    }

    #[test]
    fn remove_kind_hint_overrides_the_dependency_kind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.config.rules = vec![rule("*", json!({"dependencies": {"tool": "1.0.0"}}))];
        ws.track(id("acme/ui/button"), "components/button").expect("track");

        ws.remove_dependency(
            "acme/ui/button",
            &["tool".to_string()],
            Some(DependencyKind::Dev),
            false,
        )
        .expect("remove");
        let config = entry_config(&ws, "acme/ui/button");
        assert_eq!(config.get("devDependencies"), Some(&json!({"tool": "-"})));
        assert_eq!(config.get("dependencies"), None);
    }

    #[test]
    fn eject_materializes_inherited_policy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.config.rules = vec![rule("*", json!({"dependencies": {"inherited": "1.0.0"}}))];
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        assert!(ws.manifest().find(&id("acme/ui/button")).expect("entry").config.is_none());

        ws.eject_dependencies("acme/ui/button").expect("eject");
        assert_eq!(
            entry_config(&ws, "acme/ui/button").get("dependencies"),
            Some(&json!({"inherited": "1.0.0"}))
        );

        // the rule can change now without moving the component
        ws.config.rules = vec![rule("*", json!({"dependencies": {"inherited": "9.9.9"}}))];
        let component = ws.get(&id("acme/ui/button")).expect("load");
        let dep = component.dependencies.find_by_name_or_id("inherited", None).expect("dep");
        assert_eq!(dep.version, "1.0.0");
        assert_eq!(dep.source, DependencySource::Policy);
    }

    #[test]
    fn usage_scans_every_component_and_narrows_by_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        ws.track(id("acme/ui/card"), "components/card").expect("track");
        ws.set_dependency("acme/ui/button", &["lodash@4.17.21".to_string()], DependencyKind::Runtime)
            .expect("set");

        let usage = ws.usage("lodash").expect("usage");
        assert_eq!(usage.len(), 1);
        assert_eq!(usage.get("acme/ui/button").map(String::as_str), Some("4.17.21"));

        let narrowed = ws.usage("lodash@5.0.0").expect("usage");
        assert!(narrowed.is_empty());
    }

    #[test]
    fn usage_finds_component_dependencies_by_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        ws.track(id("acme/ui/card"), "components/card").expect("track");
        ws.set_dependency(
            "acme/ui/card",
            &["acme/ui/button@1.0.0".to_string()],
            DependencyKind::Runtime,
        )
        .expect("set");

        let usage = ws.usage("acme/ui/button").expect("usage");
        assert_eq!(usage.get("acme/ui/card").map(String::as_str), Some("1.0.0"));
    }

    #[test]
    fn usage_deep_delegates_package_names_only() {
        struct ChainReporter;
        impl PackageManager for ChainReporter {
            fn find_usages(&self, name: &str) -> Result<Option<String>, WorkspaceError> {
                Ok(Some(format!("{name} <- app")))
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let ws = memory_workspace(dir.path()).with_package_manager(Box::new(ChainReporter));
        assert_eq!(ws.usage_deep("lodash").expect("deep"), Some("lodash <- app".to_string()));
        assert_eq!(ws.usage_deep("@acme/tokens").expect("deep"), Some("@acme/tokens <- app".to_string()));
        assert_eq!(ws.usage_deep("acme/ui/button").expect("deep"), None);
    }

    #[test]
    fn debug_reports_provenance_and_manual_edits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut ws = memory_workspace(dir.path());
        ws.config.rules = vec![rule(
            "*",
            json!({"dependencies": {"inherited": "1.0.0", "dropped": "2.0.0"}}),
        )];
        ws.track(id("acme/ui/button"), "components/button").expect("track");
        ws.set_dependency("acme/ui/button", &["lodash@4.17.21".to_string()], DependencyKind::Runtime)
            .expect("set");
        ws.remove_dependency("acme/ui/button", &["dropped".to_string()], None, false)
            .expect("remove");

        let report = ws.debug_dependencies("acme/ui/button").expect("debug");
        assert_eq!(report.id, "acme/ui/button");
        assert_eq!(report.manually_added, vec!["lodash@4.17.21"]);
        assert_eq!(report.manually_removed, vec!["dropped"]);

        let lodash = report.dependencies.find_by_name_or_id("lodash", None).expect("lodash");
        assert_eq!(lodash.source, DependencySource::Policy);
        let inherited =
            report.dependencies.find_by_name_or_id("inherited", None).expect("inherited");
        assert_eq!(inherited.source, DependencySource::WorkspaceRule);
        assert!(report.dependencies.find_by_name_or_id("dropped", None).is_none());
    }
}
