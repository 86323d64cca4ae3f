use crate::support::discover_workspace_or_exit;
use serde_json::json;

pub fn run(
    pattern: String,
    message: String,
    tag: Option<String>,
    author: Option<String>,
    email: Option<String>,
    json_output: bool,
) {
    let mut ws = discover_workspace_or_exit();
    let results = ws
        .snap(&pattern, &message, author.as_deref(), email.as_deref(), tag.as_deref())
        .unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        });

    if json_output {
        let payload = json!({
            "action": "snap",
            "pattern": pattern,
            "count": results.len(),
            "snapped": results
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!("mosaic snap ({pattern})");
        println!("  Snapped: {}", results.len());
        for result in &results {
            match &result.tag {
                Some(tag) => {
                    println!("  - {} -> {} (tag {tag})", result.id, result.hash.short())
                }
                None => println!("  - {} -> {}", result.id, result.hash.short()),
            }
        }
        if results.is_empty() {
            println!("  Nothing changed since the last snapshot.");
        }
    }
}
