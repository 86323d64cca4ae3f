//! Source files as the model sees them: relative path, bytes, hash.

use crate::hash::FileHash;

/// A component source file. Paths are workspace-relative and
/// `/`-separated regardless of platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: Vec<u8>,
    pub hash: FileHash,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        let hash = FileHash::of_bytes(&content);
        SourceFile { path: path.into(), content, hash }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_follows_content() {
        let a = SourceFile::new("src/index.ts", b"export {};".to_vec());
        let b = SourceFile::new("src/other.ts", b"export {};".to_vec());
        assert_eq!(a.hash, b.hash);
        let c = SourceFile::new("src/index.ts", b"export default 1;".to_vec());
        assert_ne!(a.hash, c.hash);
    }
}
