use mosaic_workspace::Workspace;
use tracing::debug;

/// Open the workspace enclosing the current directory, or exit with the
/// error on stderr.
pub fn discover_workspace_or_exit() -> Workspace {
    let cwd = std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("error: cannot determine current directory: {e}");
        std::process::exit(1);
    });
    let ws = Workspace::discover(&cwd).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    debug!(root = %ws.root().display(), "workspace discovered");
    ws
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}
