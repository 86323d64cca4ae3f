//! A loaded component: files, effective config, resolved dependencies,
//! per-extension data.
//!
//! Components are constructed by the loader and handed out behind `Arc`;
//! nothing on them performs I/O. The modification flag is memoized
//! through interior mutability so a shared component is checked once.

use crate::dependency::DependencyList;
use crate::id::ComponentId;
use crate::issue::ComponentIssue;
use crate::overrides::OverrideSet;
use crate::snapshot::Snapshot;
use crate::source::SourceFile;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct Component {
    pub id: ComponentId,
    /// Sorted by path.
    pub files: Vec<SourceFile>,
    /// Config materialized for this component specifically, when any.
    pub local_config: Option<OverrideSet>,
    /// Effective config after overrides resolution.
    pub config: OverrideSet,
    pub dependencies: DependencyList,
    /// Data recorded by extensions during load, keyed by extension name.
    pub extension_data: BTreeMap<String, Value>,
    /// Last-known snapshot of this component, when one exists.
    pub from_snapshot: Option<Snapshot>,
    /// Soft-removed: still tracked, skipped by load callbacks.
    pub removed: bool,
    pub issues: Vec<ComponentIssue>,
    modified: OnceLock<bool>,
}

impl Component {
    pub fn new(id: ComponentId, mut files: Vec<SourceFile>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Component {
            id,
            files,
            local_config: None,
            config: OverrideSet::new(),
            dependencies: DependencyList::default(),
            extension_data: BTreeMap::new(),
            from_snapshot: None,
            removed: false,
            issues: Vec::new(),
            modified: OnceLock::new(),
        }
    }

    /// Record data under an extension's key. Object payloads merge
    /// shallowly at the first level, with the new data winning per key;
    /// anything else replaces.
    pub fn upsert_extension_data(&mut self, extension: &str, data: Value) {
        match (self.extension_data.get_mut(extension), data) {
            (Some(Value::Object(existing)), Value::Object(new_data)) => {
                for (key, value) in new_data {
                    existing.insert(key, value);
                }
            }
            (_, data) => {
                self.extension_data.insert(extension.to_string(), data);
            }
        }
    }

    /// The memoized answer of the full modification check, when it ran.
    pub fn modified_memo(&self) -> Option<bool> {
        self.modified.get().copied()
    }

    /// Record the modification answer; first write wins.
    pub fn memoize_modified(&self, value: bool) -> bool {
        *self.modified.get_or_init(|| value)
    }

    /// Package name this component publishes under.
    pub fn package_name(&self) -> String {
        let dotted = self.id.name.replace('/', ".");
        match &self.id.scope {
            Some(scope) => format!("@{scope}/{dotted}"),
            None => dotted,
        }
    }

    /// The environment the effective config selects, when any.
    pub fn env(&self) -> Option<&str> {
        self.config.get("env").and_then(Value::as_str)
    }
}
