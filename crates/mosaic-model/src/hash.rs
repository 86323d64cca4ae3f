//! Content hashing behind newtypes.
//!
//! Every hash in the system is a lowercase hex SHA-256. `SnapHash`
//! addresses snapshots, `FileHash` addresses file contents. Structured
//! values are hashed through `HashBuilder`, which feeds `name:value`
//! lines into the digest so field order is explicit at the call site.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub const HASH_HEX_LEN: usize = 64;

/// Content address of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapHash(pub String);

impl SnapHash {
    pub fn builder() -> HashBuilder {
        HashBuilder::new()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for human-facing output.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for SnapHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content address of a single file's bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHash(pub String);

impl FileHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        FileHash(sha256_hex(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let hash = hasher.finalize();
    format!("{hash:x}")
}

/// True when `s` has the shape of one of our hashes.
pub fn is_hash_shaped(s: &str) -> bool {
    s.len() == HASH_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

/// Incremental field-wise hasher.
pub struct HashBuilder {
    hasher: Sha256,
}

impl HashBuilder {
    pub fn new() -> Self {
        HashBuilder { hasher: Sha256::new() }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.hasher.update(name.as_bytes());
        self.hasher.update(b":");
        self.hasher.update(value.as_bytes());
        self.hasher.update(b"\n");
        self
    }

    pub fn field_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    pub fn finish(self) -> String {
        let hash = self.hasher.finalize();
        format!("{hash:x}")
    }
}

impl Default for HashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_hash_is_stable() {
        let a = FileHash::of_bytes(b"fn main() {}");
        let b = FileHash::of_bytes(b"fn main() {}");
        assert_eq!(a, b);
        assert!(is_hash_shaped(a.as_str()));
    }

    #[test]
    fn builder_distinguishes_field_boundaries() {
        let a = HashBuilder::new().field("name", "ab").field("scope", "c").finish();
        let b = HashBuilder::new().field("name", "a").field("scope", "bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn field_opt_skips_none() {
        let with = HashBuilder::new().field_opt("tag", Some("1.0.0")).finish();
        let without = HashBuilder::new().field_opt("tag", None).finish();
        assert_ne!(with, without);
        assert_eq!(without, HashBuilder::new().finish());
    }

    #[test]
    fn hash_shape_check_rejects_uppercase_and_short() {
        assert!(!is_hash_shaped("ABC123"));
        assert!(!is_hash_shaped(&"a".repeat(63)));
        assert!(is_hash_shaped(&"a".repeat(64)));
    }
}
