//! Package-manager collaborators.
//!
//! The workspace never talks to a registry or a node_modules tree
//! itself; these seams do. The default implementations keep a
//! network-free workspace working: version resolution fails as "not
//! found", deep usage answers nothing.

use crate::error::WorkspaceError;
use std::collections::BTreeMap;

/// Resolves `name@latest` (or a missing version) to a concrete version.
pub trait PackageVersionResolver {
    fn resolve_latest(&self, name: &str) -> Result<String, WorkspaceError>;
}

/// Deep dependency-chain queries, answered by the package manager.
pub trait PackageManager {
    /// Human-readable usage chains of `name`, when the package manager
    /// can compute them.
    fn find_usages(&self, name: &str) -> Result<Option<String>, WorkspaceError>;
}

/// Resolver backed by a fixed table. The test double, and a working
/// resolver for air-gapped setups fed from config.
#[derive(Debug, Default)]
pub struct StaticVersionResolver {
    versions: BTreeMap<String, String>,
}

impl StaticVersionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.versions.insert(name.into(), version.into());
        self
    }
}

impl PackageVersionResolver for StaticVersionResolver {
    fn resolve_latest(&self, name: &str) -> Result<String, WorkspaceError> {
        self.versions
            .get(name)
            .cloned()
            .ok_or_else(|| WorkspaceError::not_found(format!("latest version of `{name}`")))
    }
}

/// No package manager attached.
#[derive(Debug, Default)]
pub struct NoPackageManager;

impl PackageManager for NoPackageManager {
    fn find_usages(&self, _name: &str) -> Result<Option<String>, WorkspaceError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_resolver_answers_known_names_only() {
        let resolver = StaticVersionResolver::new().with("lodash", "4.17.21");
        assert_eq!(resolver.resolve_latest("lodash").expect("known"), "4.17.21");
        let err = resolver.resolve_latest("unknown").expect_err("unknown name");
        assert!(err.is_not_found());
    }
}
