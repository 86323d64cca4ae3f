//! Modification detection between a working copy and its last snapshot.
//!
//! Both checks compare normalized forms: unrelated reordering (say,
//! from a manifest rewrite) must never register as a modification.

use mosaic_model::{Component, DependencyKind, FileRecord, Snapshot};

/// Whether the component differs from the given model snapshot. The
/// answer is memoized on the component: it cannot change within one
/// logical command, and the candidate snapshot is not free to build.
pub fn is_modified(model: &Snapshot, component: &Component) -> bool {
    if let Some(memo) = component.modified_memo() {
        return memo;
    }
    let mut candidate = Snapshot::from_component(component, model.log.clone());
    backfill_versions(&mut candidate, model);
    let modified = candidate.snap_hash() != model.snap_hash();
    component.memoize_modified(modified)
}

/// Whether the component's files differ from the model snapshot's. Can
/// prove "not modified" early (a full check that already answered false
/// short-circuits) but never proves modification on its own: dependency
/// and config changes are invisible to it.
pub fn is_source_modified(model: &Snapshot, component: &Component) -> bool {
    if component.modified_memo() == Some(false) {
        return false;
    }
    let mut current: Vec<FileRecord> = component
        .files
        .iter()
        .map(|file| FileRecord { path: file.path.clone(), hash: file.hash.clone() })
        .collect();
    current.sort();
    let mut known = model.files.clone();
    known.sort();
    current != known
}

/// A candidate dependency without an explicit version takes the version
/// of the model's record for the same id ignoring version. Incompletely
/// resolved local specs must not read as modifications.
fn backfill_versions(candidate: &mut Snapshot, model: &Snapshot) {
    for kind in DependencyKind::ALL {
        for record in candidate.dependencies_of_kind_mut(kind) {
            if record.version.is_empty()
                && let Some(known) = model.find_record_ignoring_version(&record.id)
            {
                record.version = known.version.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mosaic_model::{
        ComponentId, Dependency, DependencyList, DependencySource, LogEntry, SourceFile,
    };
    use serde_json::json;

    fn log() -> LogEntry {
        LogEntry::new(
            "checkpoint",
            Utc.with_ymd_and_hms(2024, 6, 10, 8, 30, 0).single().expect("valid time"),
        )
    }

    fn component() -> Component {
        let mut c = Component::new(
            ComponentId::parse("acme/ui/button").expect("valid id"),
            vec![
                SourceFile::new("index.ts", b"export {};".to_vec()),
                SourceFile::new("readme.md", b"# button".to_vec()),
            ],
        );
        c.config.insert("env", json!("node"));
        c.dependencies = DependencyList::new(vec![Dependency::new(
            "lodash",
            "4.17.21",
            DependencyKind::Runtime,
            DependencySource::Policy,
        )]);
        c
    }

    #[test]
    fn fresh_snapshot_reads_unmodified() {
        let c = component();
        let snap = Snapshot::from_component(&c, log());
        assert!(!is_modified(&snap, &c));
        assert!(!is_source_modified(&snap, &c));
    }

    #[test]
    fn file_content_change_flips_both_checks() {
        let model = Snapshot::from_component(&component(), log());
        let mut changed = component();
        changed.files[0] = SourceFile::new("index.ts", b"export default 1;".to_vec());
        assert!(is_modified(&model, &changed));
        assert!(is_source_modified(&model, &changed));
    }

    #[test]
    fn dependency_change_is_invisible_to_the_source_check() {
        let model = Snapshot::from_component(&component(), log());
        let mut changed = component();
        changed.dependencies = DependencyList::new(vec![Dependency::new(
            "lodash",
            "5.0.0",
            DependencyKind::Runtime,
            DependencySource::Policy,
        )]);
        assert!(is_source_modified(&model, &changed), "memo not yet computed: cannot prove");
        assert!(is_modified(&model, &changed));
    }

    #[test]
    fn override_change_flips_the_full_check() {
        let model = Snapshot::from_component(&component(), log());
        let mut changed = component();
        changed.config.insert("env", json!("react"));
        assert!(is_modified(&model, &changed));
    }

    #[test]
    fn source_check_short_circuits_on_a_false_memo() {
        let c = component();
        let model = Snapshot::from_component(&c, log());
        assert!(!is_modified(&model, &c));
        // the memo now answers without comparing files
        assert!(!is_source_modified(&model, &c));
        assert_eq!(c.modified_memo(), Some(false));
    }

    #[test]
    fn empty_versions_backfill_from_the_model() {
        let c = component();
        let model = Snapshot::from_component(&c, log());
        let mut unresolved = component();
        unresolved.dependencies = DependencyList::new(vec![Dependency::new(
            "lodash",
            "",
            DependencyKind::Runtime,
            DependencySource::Policy,
        )]);
        assert!(!is_modified(&model, &unresolved), "backfilled version must match the model");
    }

    #[test]
    fn answer_is_memoized_per_component_instance() {
        let c = component();
        let model = Snapshot::from_component(&c, log());
        assert!(!is_modified(&model, &c));

        let mut other_model = Snapshot::from_component(&component(), log());
        other_model.overrides.insert("env", json!("react"));
        // the first answer sticks for this instance
        assert!(!is_modified(&other_model, &c));
    }
}
