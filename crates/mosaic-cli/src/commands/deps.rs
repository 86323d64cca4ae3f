use crate::cli::DepsCommands;
use crate::support::discover_workspace_or_exit;
use mosaic_model::DependencyKind;
use mosaic_workspace::WorkspaceError;
use serde_json::json;

pub fn run(command: DepsCommands) {
    match command {
        DepsCommands::Set { pattern, packages, dev, peer, json } => {
            run_set(pattern, packages, kind_from_flags(dev, peer), json)
        }
        DepsCommands::Remove { pattern, packages, dev, peer, if_exists, json } => {
            run_remove(pattern, packages, kind_hint_from_flags(dev, peer), if_exists, json)
        }
        DepsCommands::Reset { pattern, json } => run_reset(pattern, json),
        DepsCommands::Eject { pattern, json } => run_eject(pattern, json),
        DepsCommands::Usage { dep, deep, json } => run_usage(dep, deep, json),
        DepsCommands::Blame { component, dep, json } => run_blame(component, dep, json),
        DepsCommands::Debug { id, json } => run_debug(id, json),
    }
}

fn kind_from_flags(dev: bool, peer: bool) -> DependencyKind {
    if dev {
        DependencyKind::Dev
    } else if peer {
        DependencyKind::Peer
    } else {
        DependencyKind::Runtime
    }
}

fn kind_hint_from_flags(dev: bool, peer: bool) -> Option<DependencyKind> {
    if dev {
        Some(DependencyKind::Dev)
    } else if peer {
        Some(DependencyKind::Peer)
    } else {
        None
    }
}

fn or_exit<T>(result: Result<T, WorkspaceError>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

fn run_set(pattern: String, packages: Vec<String>, kind: DependencyKind, json_output: bool) {
    let mut ws = discover_workspace_or_exit();
    let result = or_exit(ws.set_dependency(&pattern, &packages, kind));

    if json_output {
        let payload = json!({
            "action": "deps.set",
            "pattern": pattern,
            "kind": kind.to_string(),
            "count": result.changed.len(),
            "added": result.added,
            "changed": result.changed
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("mosaic deps set ({pattern})");
        for (name, version) in &result.added {
            println!("  Pinned: {name}@{version} ({kind})");
        }
        println!("  Components: {}", result.changed.len());
        for id in &result.changed {
            println!("  - {id}");
        }
    }
}

fn run_remove(
    pattern: String,
    packages: Vec<String>,
    kind_hint: Option<DependencyKind>,
    if_exists: bool,
    json_output: bool,
) {
    let mut ws = discover_workspace_or_exit();
    let results = or_exit(ws.remove_dependency(&pattern, &packages, kind_hint, if_exists));

    if json_output {
        let items = results
            .iter()
            .map(|result| json!({ "id": result.id, "removed": result.removed }))
            .collect::<Vec<_>>();
        let payload = json!({
            "action": "deps.remove",
            "pattern": pattern,
            "count": items.len(),
            "items": items
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("mosaic deps remove ({pattern})");
        println!("  Components: {}", results.len());
        for result in &results {
            println!("  - {}: {}", result.id, result.removed.join(", "));
        }
    }
}

fn run_reset(pattern: String, json_output: bool) {
    let mut ws = discover_workspace_or_exit();
    let ids = or_exit(ws.reset_dependencies(&pattern));
    let ids: Vec<String> = ids.iter().map(|id| id.to_string_no_version()).collect();

    if json_output {
        let payload = json!({
            "action": "deps.reset",
            "pattern": pattern,
            "count": ids.len(),
            "components": ids
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("mosaic deps reset ({pattern})");
        println!("  Components: {}", ids.len());
        for id in &ids {
            println!("  - {id}");
        }
    }
}

fn run_eject(pattern: String, json_output: bool) {
    let mut ws = discover_workspace_or_exit();
    let ids = or_exit(ws.eject_dependencies(&pattern));
    let ids: Vec<String> = ids.iter().map(|id| id.to_string_no_version()).collect();

    if json_output {
        let payload = json!({
            "action": "deps.eject",
            "pattern": pattern,
            "count": ids.len(),
            "components": ids
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("mosaic deps eject ({pattern})");
        println!("  Components: {}", ids.len());
        for id in &ids {
            println!("  - {id}");
        }
    }
}

pub fn run_usage(dep: String, deep: bool, json_output: bool) {
    let mut ws = discover_workspace_or_exit();
    let usages = or_exit(ws.usage(&dep));
    let chains = if deep { or_exit(ws.usage_deep(&dep)) } else { None };

    if json_output {
        let payload = json!({
            "action": "deps.usage",
            "dep": dep,
            "count": usages.len(),
            "usages": usages,
            "transitive": chains
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("mosaic deps usage {dep}");
        println!("  Count: {}", usages.len());
        for (component, version) in &usages {
            println!("  - {component}: {version}");
        }
        if let Some(chains) = &chains {
            println!("  Transitive:");
            for line in chains.lines() {
                println!("    {line}");
            }
        }
    }
}

fn run_blame(component: String, dep: String, json_output: bool) {
    let mut ws = discover_workspace_or_exit();
    let entries = or_exit(ws.blame(&component, &dep));

    if json_output {
        let payload = json!({
            "action": "deps.blame",
            "component": component,
            "dep": dep,
            "count": entries.len(),
            "entries": entries
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("mosaic deps blame {component} {dep}");
        println!("  Entries: {}", entries.len());
        for entry in &entries {
            let tag = entry.tag.as_deref().map(|t| format!(" (tag {t})")).unwrap_or_default();
            println!(
                "  - {} {} {} {}{} {}",
                entry.snap.short(),
                entry.date,
                entry.author,
                entry.version,
                tag,
                entry.message
            );
        }
    }
}

fn run_debug(id: String, json_output: bool) {
    let mut ws = discover_workspace_or_exit();
    let report = or_exit(ws.debug_dependencies(&id));

    if json_output {
        let payload = json!({
            "action": "deps.debug",
            "id": report.id,
            "dependencies": report.dependencies,
            "manuallyAdded": report.manually_added,
            "manuallyRemoved": report.manually_removed,
            "issues": report.issues
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("mosaic deps debug {}", report.id);
        println!("  Dependencies: {}", report.dependencies.len());
        for dep in &report.dependencies {
            println!("  - {} {} ({}, {})", dep.name, dep.version, dep.kind, dep.source);
        }
        if !report.manually_added.is_empty() {
            println!("  Manually added: {}", report.manually_added.join(", "));
        }
        if !report.manually_removed.is_empty() {
            println!("  Manually removed: {}", report.manually_removed.join(", "));
        }
        for issue in &report.issues {
            println!("  Issue: {issue}");
        }
    }
}
