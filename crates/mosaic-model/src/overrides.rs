//! Override sets: JSON-valued config fields and their merge algebra.
//!
//! An override set maps field names (`dependencies`, `devDependencies`,
//! `peerDependencies`, or arbitrary config keys) to JSON values. Merging
//! is two-sided and precedence-aware: the higher side keeps its plain
//! fields, object-valued fields merge key-wise with the higher side
//! winning collisions. Internal fields never cross a merge boundary from
//! the lower side.

use crate::dependency::DependencyKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Version spec marking a dependency as removed at this precedence level.
pub const TOMBSTONE: &str = "-";

/// Field names that never merge in from workspace rules or extension
/// contributions. A component's own config keeps the ones it wrote.
pub mod internal_fields {
    pub const PROPAGATE: &str = "propagate";
    pub const EXCLUDE: &str = "exclude";
    pub const EXTENSIONS: &str = "extensions";
    pub const DEFAULT_SCOPE: &str = "defaultScope";

    pub const ALL: [&str; 4] = [PROPAGATE, EXCLUDE, EXTENSIONS, DEFAULT_SCOPE];

    pub fn is_internal(field: &str) -> bool {
        ALL.contains(&field)
    }
}

/// A field that could not merge cleanly. Collected, not thrown: callers
/// decide whether these are diagnostics or hard failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMergeIssue {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldMergeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field `{}`: {}", self.field, self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideSet(pub BTreeMap<String, Value>);

impl OverrideSet {
    pub fn new() -> Self {
        OverrideSet(BTreeMap::new())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `name -> version spec` map of one dependency field, when it
    /// is present and object-shaped.
    pub fn dependency_field(&self, kind: DependencyKind) -> Option<&Map<String, Value>> {
        self.0.get(kind.field_name()).and_then(Value::as_object)
    }

    pub fn dependency_field_mut(&mut self, kind: DependencyKind) -> &mut Map<String, Value> {
        let entry = self
            .0
            .entry(kind.field_name().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => map,
            _ => unreachable!("dependency field was normalized to an object above"),
        }
    }

    /// Drop internal fields. Applied to workspace rules and extension
    /// contributions before they enter a merge.
    pub fn strip_internal(&mut self) {
        self.0.retain(|field, _| !internal_fields::is_internal(field));
    }

    /// Drop fields whose value carries no information (empty object,
    /// array, or string). Extension contributions are filtered this way
    /// after combining.
    pub fn drop_empty_values(&mut self) {
        self.0.retain(|_, value| match value {
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        });
    }

    /// Merge `lower` into `higher`. The higher side keeps its plain
    /// fields; object-valued fields merge key-wise with higher winning;
    /// internal fields on the lower side are skipped. Shape conflicts
    /// and malformed dependency version specs are reported per field and
    /// never abort the rest of the merge.
    pub fn merge(higher: &OverrideSet, lower: &OverrideSet) -> (OverrideSet, Vec<FieldMergeIssue>) {
        let mut result = higher.clone();
        let mut issues = Vec::new();
        for (field, low) in &lower.0 {
            if internal_fields::is_internal(field) {
                continue;
            }
            match result.0.get_mut(field) {
                Some(high) => match (&mut *high, low) {
                    (Value::Object(high_map), Value::Object(low_map)) => {
                        for (key, value) in low_map {
                            if !high_map.contains_key(key) {
                                high_map.insert(key.clone(), value.clone());
                            }
                        }
                    }
                    (Value::Object(_), _) | (_, Value::Object(_)) => {
                        issues.push(FieldMergeIssue {
                            field: field.clone(),
                            reason: "object and non-object values cannot merge; keeping the higher-precedence value".to_string(),
                        });
                    }
                    _ => {}
                },
                None => {
                    result.0.insert(field.clone(), low.clone());
                }
            }
        }
        issues.extend(result.validate_dependency_fields());
        (result, issues)
    }

    /// Check the three dependency fields for malformed version specs.
    pub fn validate_dependency_fields(&self) -> Vec<FieldMergeIssue> {
        let mut issues = Vec::new();
        for kind in DependencyKind::ALL {
            let field = kind.field_name();
            let Some(value) = self.0.get(field) else { continue };
            let Some(map) = value.as_object() else {
                issues.push(FieldMergeIssue {
                    field: field.to_string(),
                    reason: "expected an object of name -> version spec".to_string(),
                });
                continue;
            };
            for (name, spec) in map {
                match spec.as_str() {
                    Some(s) if !s.is_empty() && !s.chars().any(char::is_whitespace) => {}
                    Some(_) => issues.push(FieldMergeIssue {
                        field: format!("{field}.{name}"),
                        reason: "malformed version spec".to_string(),
                    }),
                    None => issues.push(FieldMergeIssue {
                        field: format!("{field}.{name}"),
                        reason: "version spec must be a string".to_string(),
                    }),
                }
            }
        }
        issues
    }
}

impl FromIterator<(String, Value)> for OverrideSet {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        OverrideSet(iter.into_iter().collect())
    }
}

/// Recursive object merge where the earlier side wins scalar collisions.
/// Used to combine extension contributions in registration order.
pub fn deep_merge_left(earlier: &Value, later: &Value) -> Value {
    match (earlier, later) {
        (Value::Object(first), Value::Object(second)) => {
            let mut merged = first.clone();
            for (key, value) in second {
                match merged.get(key) {
                    Some(existing) => {
                        let combined = deep_merge_left(existing, value);
                        merged.insert(key.clone(), combined);
                    }
                    None => {
                        merged.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(merged)
        }
        _ => earlier.clone(),
    }
}
