//! Workspace-level configuration: default scope and override rules.
//!
//! Rules pair a component pattern with an override set. For one
//! component, every matching rule applies, later rules winning
//! conflicts, so broad defaults go first and narrow exceptions after.

use crate::pattern::IdPattern;
use mosaic_model::{ComponentId, FieldMergeIssue, OverrideSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

pub const WORKSPACE_CONFIG_FILE: &str = "workspace.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt workspace config at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRule {
    pub pattern: String,
    pub overrides: OverrideSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<OverrideRule>,
}

impl WorkspaceConfig {
    /// Load from `workspace.json`; a missing file is an empty config.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Ok(WorkspaceConfig::default());
        }
        let bytes =
            fs::read(&path).map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ConfigError::Corrupt { path, reason: e.to_string() })
    }

    /// The combined workspace rules for one component: fold every
    /// matching rule in order, later rules winning, internal fields
    /// stripped at the door.
    pub fn rules_for(&self, id: &ComponentId) -> (OverrideSet, Vec<FieldMergeIssue>) {
        let mut combined = OverrideSet::new();
        let mut issues = Vec::new();
        for rule in &self.rules {
            let Ok(pattern) = IdPattern::parse(&rule.pattern) else {
                issues.push(FieldMergeIssue {
                    field: rule.pattern.clone(),
                    reason: "unparsable rule pattern; rule skipped".to_string(),
                });
                continue;
            };
            if !pattern.matches(id) {
                continue;
            }
            let mut overrides = rule.overrides.clone();
            overrides.strip_internal();
            let (merged, merge_issues) = OverrideSet::merge(&overrides, &combined);
            combined = merged;
            issues.extend(merge_issues);
        }
        (combined, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(pattern: &str, overrides: serde_json::Value) -> OverrideRule {
        let serde_json::Value::Object(map) = overrides else { panic!("rule must be an object") };
        OverrideRule { pattern: pattern.to_string(), overrides: map.into_iter().collect() }
    }

    fn id(s: &str) -> ComponentId {
        ComponentId::parse(s).expect("valid id")
    }

    #[test]
    fn later_matching_rule_wins() {
        let config = WorkspaceConfig {
            default_scope: None,
            rules: vec![
                rule("acme/*", json!({"dependencies": {"lodash": "4.0.0"}, "env": "node"})),
                rule("acme/ui/*", json!({"dependencies": {"lodash": "4.17.21"}})),
            ],
        };
        let (combined, issues) = config.rules_for(&id("acme/ui/button"));
        assert!(issues.is_empty());
        assert_eq!(
            combined.get("dependencies"),
            Some(&json!({"lodash": "4.17.21"})),
            "the narrower, later rule overrides"
        );
        assert_eq!(combined.get("env"), Some(&json!("node")));
    }

    #[test]
    fn non_matching_rules_do_not_apply() {
        let config = WorkspaceConfig {
            default_scope: None,
            rules: vec![rule("other/*", json!({"env": "browser"}))],
        };
        let (combined, _) = config.rules_for(&id("acme/button"));
        assert!(combined.is_empty());
    }

    #[test]
    fn internal_fields_are_stripped_from_rules() {
        let config = WorkspaceConfig {
            default_scope: None,
            rules: vec![rule("*", json!({"propagate": false, "env": "node"}))],
        };
        let (combined, _) = config.rules_for(&id("acme/button"));
        assert_eq!(combined.get("propagate"), None);
        assert_eq!(combined.get("env"), Some(&json!("node")));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = WorkspaceConfig::load(dir.path().join(WORKSPACE_CONFIG_FILE)).expect("load");
        assert_eq!(config, WorkspaceConfig::default());
    }

    #[test]
    fn loads_from_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(WORKSPACE_CONFIG_FILE);
        std::fs::write(
            &path,
            serde_json::to_vec_pretty(&json!({
                "defaultScope": "acme",
                "rules": [
                    {"pattern": "acme/*", "overrides": {"env": "node"}}
                ]
            }))
            .expect("json"),
        )
        .expect("seed config");
        let config = WorkspaceConfig::load(&path).expect("load");
        assert_eq!(config.default_scope.as_deref(), Some("acme"));
        assert_eq!(config.rules.len(), 1);
    }
}
