//! Component identifiers.
//!
//! Canonical string form is `[scope/]name[@version]`. The name may carry
//! further `/` namespace segments; the segment before the first `/` is the
//! scope. A version is either a snap hash or a tag alias, and its absence
//! means "the working copy".

use crate::hash::{SnapHash, is_hash_shaped};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("empty component id")]
    Empty,
    #[error("component id `{id}` has an empty scope segment")]
    EmptyScope { id: String },
    #[error("component id `{id}` has an empty name")]
    EmptyName { id: String },
    #[error("component id `{id}` has an empty version suffix")]
    EmptyVersion { id: String },
    #[error("component id `{id}` carries more than one version suffix")]
    MultipleVersions { id: String },
}

/// A resolved or requested version: either the content address of a
/// snapshot or a human-assigned tag that the scope resolves to one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VersionRef {
    Snap(SnapHash),
    Tag(String),
}

impl VersionRef {
    pub fn parse(s: &str) -> Self {
        if is_hash_shaped(s) {
            VersionRef::Snap(SnapHash(s.to_string()))
        } else {
            VersionRef::Tag(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            VersionRef::Snap(hash) => hash.as_str(),
            VersionRef::Tag(tag) => tag.as_str(),
        }
    }

    pub fn is_snap(&self) -> bool {
        matches!(self, VersionRef::Snap(_))
    }
}

impl From<String> for VersionRef {
    fn from(s: String) -> Self {
        VersionRef::parse(&s)
    }
}

impl From<VersionRef> for String {
    fn from(v: VersionRef) -> Self {
        v.as_str().to_string()
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionRef>,
}

impl ComponentId {
    pub fn new(scope: Option<String>, name: impl Into<String>) -> Self {
        ComponentId { scope, name: name.into(), version: None }
    }

    pub fn parse(id: &str) -> Result<Self, IdError> {
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        let (body, version) = match id.split_once('@') {
            Some((body, ver)) => {
                if ver.is_empty() {
                    return Err(IdError::EmptyVersion { id: id.to_string() });
                }
                if ver.contains('@') {
                    return Err(IdError::MultipleVersions { id: id.to_string() });
                }
                (body, Some(VersionRef::parse(ver)))
            }
            None => (id, None),
        };
        let (scope, name) = match body.split_once('/') {
            Some((scope, rest)) => {
                if scope.is_empty() {
                    return Err(IdError::EmptyScope { id: id.to_string() });
                }
                (Some(scope.to_string()), rest.to_string())
            }
            None => (None, body.to_string()),
        };
        if name.is_empty() {
            return Err(IdError::EmptyName { id: id.to_string() });
        }
        Ok(ComponentId { scope, name, version })
    }

    /// Same component, any version.
    pub fn is_same_component(&self, other: &ComponentId) -> bool {
        self.scope == other.scope && self.name == other.name
    }

    pub fn with_version(&self, version: VersionRef) -> ComponentId {
        ComponentId { scope: self.scope.clone(), name: self.name.clone(), version: Some(version) }
    }

    pub fn without_version(&self) -> ComponentId {
        ComponentId { scope: self.scope.clone(), name: self.name.clone(), version: None }
    }

    pub fn to_string_no_version(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{scope}/{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn has_version(&self) -> bool {
        self.version.is_some()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_no_version())?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}
