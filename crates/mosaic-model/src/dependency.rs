//! Resolved dependencies of a loaded component.

use crate::id::ComponentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a dependency, keyed by the persisted field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyKind {
    Runtime,
    Dev,
    Peer,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 3] =
        [DependencyKind::Runtime, DependencyKind::Dev, DependencyKind::Peer];

    pub fn field_name(self) -> &'static str {
        match self {
            DependencyKind::Runtime => "dependencies",
            DependencyKind::Dev => "devDependencies",
            DependencyKind::Peer => "peerDependencies",
        }
    }

    pub fn from_field_name(field: &str) -> Option<Self> {
        match field {
            "dependencies" => Some(DependencyKind::Runtime),
            "devDependencies" => Some(DependencyKind::Dev),
            "peerDependencies" => Some(DependencyKind::Peer),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DependencyKind::Runtime => "runtime",
            DependencyKind::Dev => "dev",
            DependencyKind::Peer => "peer",
        };
        write!(f, "{label}")
    }
}

/// Which precedence level produced a dependency's winning version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencySource {
    /// The component's own policy.
    Policy,
    /// A matching workspace rule.
    WorkspaceRule,
    /// An extension contribution.
    Extension,
}

impl fmt::Display for DependencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DependencySource::Policy => "policy",
            DependencySource::WorkspaceRule => "workspace_rule",
            DependencySource::Extension => "extension",
        };
        write!(f, "{label}")
    }
}

/// One resolved dependency. `name` is a package name or a component id
/// string without version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub kind: DependencyKind,
    pub source: DependencySource,
}

impl Dependency {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        kind: DependencyKind,
        source: DependencySource,
    ) -> Self {
        Dependency { name: name.into(), version: version.into(), kind, source }
    }

    /// The component-id reading of this dependency, when it has one.
    pub fn as_component_id(&self) -> Option<ComponentId> {
        if is_component_id(&self.name) { ComponentId::parse(&self.name).ok() } else { None }
    }
}

/// A string names a component (not a package) when it has a `/` path
/// separator and no npm-style `@scope` prefix.
pub fn is_component_id(s: &str) -> bool {
    s.contains('/') && !s.starts_with('@')
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyList(Vec<Dependency>);

impl DependencyList {
    pub fn new(mut deps: Vec<Dependency>) -> Self {
        deps.sort_by(|a, b| (a.kind, &a.name, &a.version).cmp(&(b.kind, &b.name, &b.version)));
        DependencyList(deps)
    }

    /// Locate a dependency by package name or by component id ignoring
    /// version; an explicit version narrows the match.
    pub fn find_by_name_or_id(&self, name: &str, version: Option<&str>) -> Option<&Dependency> {
        self.0.iter().find(|dep| {
            let name_matches = dep.name == name
                || match (dep.as_component_id(), ComponentId::parse(name)) {
                    (Some(dep_id), Ok(query_id)) => dep_id.is_same_component(&query_id),
                    _ => false,
                };
            name_matches && version.is_none_or(|v| dep.version == v)
        })
    }

    pub fn of_kind(&self, kind: DependencyKind) -> impl Iterator<Item = &Dependency> {
        self.0.iter().filter(move |dep| dep.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a DependencyList {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(name: &str, version: &str, kind: DependencyKind) -> Dependency {
        Dependency::new(name, version, kind, DependencySource::Policy)
    }

    #[test]
    fn component_id_detection() {
        assert!(is_component_id("acme/ui/button"));
        assert!(!is_component_id("@acme/tokens"));
        assert!(!is_component_id("lodash"));
    }

    #[test]
    fn list_sorts_on_construction() {
        let list = DependencyList::new(vec![
            dep("zlib", "1.0.0", DependencyKind::Runtime),
            dep("alpha", "2.0.0", DependencyKind::Runtime),
            dep("dev-only", "0.1.0", DependencyKind::Dev),
        ]);
        let names: Vec<&str> = list.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zlib", "dev-only"]);
    }

    #[test]
    fn finds_by_package_name_with_version_narrowing() {
        let list = DependencyList::new(vec![dep("lodash", "4.17.21", DependencyKind::Runtime)]);
        assert!(list.find_by_name_or_id("lodash", None).is_some());
        assert!(list.find_by_name_or_id("lodash", Some("4.17.21")).is_some());
        assert!(list.find_by_name_or_id("lodash", Some("5.0.0")).is_none());
    }

    #[test]
    fn finds_component_dependency_ignoring_version() {
        let list = DependencyList::new(vec![dep("acme/ui/button", "1.0.0", DependencyKind::Runtime)]);
        assert!(list.find_by_name_or_id("acme/ui/button", None).is_some());
        // a versioned query still matches the same component
        assert!(list.find_by_name_or_id("acme/ui/button@2.0.0", None).is_some());
        assert!(list.find_by_name_or_id("acme/ui/card", None).is_none());
    }

    #[test]
    fn kind_field_names_round_trip() {
        for kind in DependencyKind::ALL {
            assert_eq!(DependencyKind::from_field_name(kind.field_name()), Some(kind));
        }
        assert_eq!(DependencyKind::from_field_name("scripts"), None);
    }
}
