//! Blame: which snapshot changed a dependency.
//!
//! Walks a component's log oldest to newest and reports every snapshot
//! at which the target dependency's version differs from the running
//! baseline. A disappearance emits a synthetic `<REMOVED>` entry and
//! becomes the new baseline, so a later reappearance counts as a change
//! no matter which version it comes back at.

use crate::error::WorkspaceError;
use crate::loader::LoadOptions;
use crate::workspace::Workspace;
use mosaic_model::{SnapHash, VersionRef};
use serde::Serialize;

/// Version value of the synthetic entry emitted when a dependency
/// disappears from the history.
pub const REMOVED_VERSION: &str = "<REMOVED>";

/// Author shown when a snapshot's log carries none.
pub const UNKNOWN_AUTHOR: &str = "<N/A>";

/// One point in history where the dependency's version changed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlameEntry {
    pub snap: SnapHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub author: String,
    /// Log timestamp as `YYYY-MM-DD HH:MM:SS`.
    pub date: String,
    pub message: String,
    /// The dependency's version as of this snapshot, or `<REMOVED>`.
    pub version: String,
}

impl Workspace {
    /// Which snaps changed `dependency` for `component`, oldest to
    /// newest. A dependency absent from the start never emits; equal
    /// consecutive versions collapse into the first sighting.
    pub fn blame(
        &mut self,
        component: &str,
        dependency: &str,
    ) -> Result<Vec<BlameEntry>, WorkspaceError> {
        let id = self.resolve_id(component)?;
        let log = self.store.get_log(&id)?;

        let mut entries = Vec::new();
        let mut last_version = String::new();
        for (hash, snapshot) in log {
            let historical = self
                .load(&id.with_version(VersionRef::Snap(hash.clone())), &LoadOptions::default())?;
            let version = match historical.dependencies.find_by_name_or_id(dependency, None) {
                Some(found) => {
                    if found.version == last_version {
                        continue;
                    }
                    found.version.clone()
                }
                None => {
                    if last_version.is_empty() || last_version == REMOVED_VERSION {
                        continue;
                    }
                    REMOVED_VERSION.to_string()
                }
            };
            last_version = version.clone();
            entries.push(BlameEntry {
                snap: hash,
                tag: snapshot.log.tag,
                author: snapshot.log.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                date: snapshot.log.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                message: snapshot.log.message,
                version,
            });
        }
        Ok(entries)
    }
}
