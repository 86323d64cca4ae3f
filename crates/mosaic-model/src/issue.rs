//! Diagnostics attached to a component during load. Issues report,
//! they never fail a load by themselves.

use crate::overrides::FieldMergeIssue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentIssue {
    /// More than one environment is configured for the component.
    MultipleEnvs { envs: Vec<String> },
    /// A config field could not merge cleanly.
    MergeConflict { field: String, reason: String },
    /// An extension's overrides callback failed; the others still ran.
    ExtensionFailed { extension: String, reason: String },
}

impl From<FieldMergeIssue> for ComponentIssue {
    fn from(issue: FieldMergeIssue) -> Self {
        ComponentIssue::MergeConflict { field: issue.field, reason: issue.reason }
    }
}

impl fmt::Display for ComponentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentIssue::MultipleEnvs { envs } => {
                write!(f, "multiple environments configured: {}", envs.join(", "))
            }
            ComponentIssue::MergeConflict { field, reason } => {
                write!(f, "config merge conflict on `{field}`: {reason}")
            }
            ComponentIssue::ExtensionFailed { extension, reason } => {
                write!(f, "extension `{extension}` failed to contribute overrides: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let issue = ComponentIssue::MultipleEnvs { envs: vec!["node".into(), "react".into()] };
        let value = serde_json::to_value(&issue).expect("serialize");
        assert_eq!(value["kind"], "multiple_envs");
        let back: ComponentIssue = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, issue);
    }
}
