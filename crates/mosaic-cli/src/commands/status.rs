use crate::support::{discover_workspace_or_exit, yes_no};
use serde_json::json;

pub fn run(id: String, json_output: bool) {
    let mut ws = discover_workspace_or_exit();
    let resolved = ws.resolve_id(&id).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    let report = ws.status(&resolved).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    if json_output {
        let payload = json!({
            "action": "status",
            "id": report.id,
            "new": report.new,
            "modified": report.modified,
            "sourceModified": report.source_modified,
            "removed": report.removed,
            "issues": report.issues
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("mosaic status {}", report.id);
        println!("  New: {}", yes_no(report.new));
        println!("  Modified: {}", yes_no(report.modified));
        println!("  Source modified: {}", yes_no(report.source_modified));
        println!("  Removed: {}", yes_no(report.removed));
        for issue in &report.issues {
            println!("  Issue: {issue}");
        }
    }
}
