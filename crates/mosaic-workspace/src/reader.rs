//! The component reader: the only collaborator that touches component
//! source bytes.
//!
//! A reader turns a manifest location into files plus the config file's
//! contents, when one is written there. The loader stays byte-agnostic.

use crate::error::WorkspaceError;
use mosaic_model::{OverrideSet, SourceFile};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File holding a component's own config inside its directory. Read as
/// config, never listed as a source file.
pub const COMPONENT_CONFIG_FILE: &str = "component.json";

#[derive(Debug, Default)]
pub struct ComponentSource {
    pub files: Vec<SourceFile>,
    pub local_config: Option<OverrideSet>,
}

pub trait ComponentReader {
    fn read(&self, location: &str) -> Result<ComponentSource, WorkspaceError>;
}

/// Reads component directories beneath the workspace root.
#[derive(Debug)]
pub struct FsReader {
    root: PathBuf,
}

impl FsReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsReader { root: root.into() }
    }
}

impl ComponentReader for FsReader {
    fn read(&self, location: &str) -> Result<ComponentSource, WorkspaceError> {
        let dir = self.root.join(location);
        if !dir.is_dir() {
            return Err(WorkspaceError::not_found(format!("component directory `{location}`")));
        }
        let mut files = Vec::new();
        collect_files(&dir, &dir, &mut files).map_err(|(path, source)| {
            WorkspaceError::invalid_component(location, format!("{}: {source}", path.display()))
        })?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let mut local_config = None;
        let config_path = dir.join(COMPONENT_CONFIG_FILE);
        if config_path.is_file() {
            let bytes = fs::read(&config_path).map_err(|e| {
                WorkspaceError::invalid_component(location, format!("unreadable config: {e}"))
            })?;
            let parsed: OverrideSet = serde_json::from_slice(&bytes).map_err(|e| {
                WorkspaceError::invalid_component(location, format!("unparsable config: {e}"))
            })?;
            local_config = Some(parsed);
        }
        Ok(ComponentSource { files, local_config })
    }
}

fn collect_files(
    root: &Path,
    dir: &Path,
    out: &mut Vec<SourceFile>,
) -> Result<(), (PathBuf, std::io::Error)> {
    let entries = fs::read_dir(dir).map_err(|e| (dir.to_path_buf(), e))?;
    let mut paths: Vec<PathBuf> =
        entries.filter_map(Result::ok).map(|entry| entry.path()).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            collect_files(root, &path, out)?;
            continue;
        }
        let relative = path
            .strip_prefix(root)
            .map_err(|_| (path.clone(), std::io::Error::other("path escapes component root")))?;
        let name = relative.to_string_lossy().replace('\\', "/");
        if name == COMPONENT_CONFIG_FILE {
            continue;
        }
        let content = fs::read(&path).map_err(|e| (path.clone(), e))?;
        out.push(SourceFile::new(name, content));
    }
    Ok(())
}

/// Reader over an in-memory table, keyed by location. The test double,
/// and the embedding seam for callers that already hold file contents.
#[derive(Debug, Default)]
pub struct MemoryReader {
    components: BTreeMap<String, (Vec<(String, Vec<u8>)>, Option<OverrideSet>)>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        location: impl Into<String>,
        files: Vec<(String, Vec<u8>)>,
        local_config: Option<OverrideSet>,
    ) {
        self.components.insert(location.into(), (files, local_config));
    }

    pub fn set_local_config(&mut self, location: &str, local_config: Option<OverrideSet>) {
        if let Some(slot) = self.components.get_mut(location) {
            slot.1 = local_config;
        }
    }

    pub fn set_file(&mut self, location: &str, path: &str, content: Vec<u8>) {
        if let Some((files, _)) = self.components.get_mut(location) {
            match files.iter_mut().find(|(p, _)| p == path) {
                Some((_, existing)) => *existing = content,
                None => files.push((path.to_string(), content)),
            }
        }
    }
}

impl ComponentReader for MemoryReader {
    fn read(&self, location: &str) -> Result<ComponentSource, WorkspaceError> {
        let (files, local_config) = self
            .components
            .get(location)
            .ok_or_else(|| WorkspaceError::not_found(format!("component directory `{location}`")))?;
        Ok(ComponentSource {
            files: files
                .iter()
                .map(|(path, content)| SourceFile::new(path.clone(), content.clone()))
                .collect(),
            local_config: local_config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fs_reader_collects_files_and_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let component_dir = dir.path().join("components/button");
        fs::create_dir_all(component_dir.join("src")).expect("mkdir");
        fs::write(component_dir.join("src/index.ts"), b"export {};").expect("file");
        fs::write(component_dir.join("readme.md"), b"# button").expect("file");
        fs::write(
            component_dir.join(COMPONENT_CONFIG_FILE),
            serde_json::to_vec(&json!({"dependencies": {"lodash": "4.17.21"}})).expect("json"),
        )
        .expect("config");

        let reader = FsReader::new(dir.path());
        let source = reader.read("components/button").expect("read");
        let paths: Vec<&str> = source.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["readme.md", "src/index.ts"]);
        let config = source.local_config.expect("config present");
        assert_eq!(config.get("dependencies"), Some(&json!({"lodash": "4.17.21"})));
    }

    #[test]
    fn fs_reader_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reader = FsReader::new(dir.path());
        let err = reader.read("components/ghost").expect_err("must fail");
        assert!(err.is_not_found());
    }

    #[test]
    fn fs_reader_bad_config_is_invalid_component() {
        let dir = tempfile::tempdir().expect("tempdir");
        let component_dir = dir.path().join("components/button");
        fs::create_dir_all(&component_dir).expect("mkdir");
        fs::write(component_dir.join(COMPONENT_CONFIG_FILE), b"{ not json").expect("config");

        let reader = FsReader::new(dir.path());
        let err = reader.read("components/button").expect_err("must fail");
        assert!(err.is_invalid_component());
    }
}
