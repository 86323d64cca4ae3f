//! Override resolution and version resolution.
//!
//! One effective config per component, assembled from three layers.
//! Per-key precedence: locally written config, then extension
//! contributions, then workspace rules. Object-valued fields merge
//! key-wise at each boundary with the higher layer's keys winning.

use crate::config::WorkspaceConfig;
use crate::extensions::{ExtensionRegistry, OverridesContext};
use crate::manifest::Manifest;
use mosaic_model::{ComponentId, ComponentIssue, OverrideSet, deep_merge_left};

/// Outcome of the override pipeline. The intermediate layers stay
/// visible so callers can report where a value came from.
#[derive(Debug, Default)]
pub struct ResolvedOverrides {
    pub effective: OverrideSet,
    pub workspace_part: OverrideSet,
    pub extension_part: OverrideSet,
    pub issues: Vec<ComponentIssue>,
}

/// Resolve the effective override set for one component. Never fails:
/// merge conflicts and extension failures are collected as issues and
/// attached to the component as diagnostics.
pub fn resolve_overrides(
    config: &WorkspaceConfig,
    registry: &ExtensionRegistry,
    ctx: &OverridesContext<'_>,
) -> ResolvedOverrides {
    let mut issues = Vec::new();

    let (workspace_part, rule_issues) = config.rules_for(ctx.id);
    issues.extend(rule_issues.into_iter().map(|issue| ComponentIssue::MergeConflict {
        field: issue.field,
        reason: issue.reason,
    }));

    // Extension contributions combine in registration order, earlier
    // registration winning collisions. A failing hook never blocks the
    // hooks after it.
    let mut extension_part = OverrideSet::new();
    for extension in registry.iter() {
        let Some(hook) = extension.overrides_hook() else { continue };
        match hook(ctx) {
            Ok(mut contribution) => {
                contribution.strip_internal();
                for (field, value) in contribution.fields() {
                    let combined = match extension_part.get(field) {
                        Some(existing) => deep_merge_left(existing, value),
                        None => value.clone(),
                    };
                    extension_part.insert(field.clone(), combined);
                }
            }
            Err(reason) => issues.push(ComponentIssue::ExtensionFailed {
                extension: extension.name().to_string(),
                reason,
            }),
        }
    }
    extension_part.drop_empty_values();

    let (from_rules, merge_issues) = OverrideSet::merge(&extension_part, &workspace_part);
    issues.extend(merge_issues.into_iter().map(ComponentIssue::from));

    let effective = match ctx.local_config {
        Some(local) => {
            let (merged, local_issues) = OverrideSet::merge(local, &from_rules);
            issues.extend(local_issues.into_iter().map(ComponentIssue::from));
            merged
        }
        None => from_rules,
    };

    ResolvedOverrides { effective, workspace_part, extension_part, issues }
}

/// Pin an identifier to the version the workspace currently holds. An
/// explicit version passes through untouched; otherwise the manifest
/// entry's version fills in. Soft-removed entries still resolve.
pub fn resolve_version(manifest: &Manifest, id: &ComponentId) -> ComponentId {
    if id.has_version() {
        return id.clone();
    }
    match manifest.find(id).and_then(|entry| entry.version.clone()) {
        Some(version) => id.with_version(version),
        None => id.clone(),
    }
}
