//! Error taxonomy for workspace operations.
//!
//! The classes matter to batch behavior: `NotFound` and
//! `InvalidComponent` are collected during batch loads, everything else
//! aborts the batch. `MalformedSpec` is always raised before any policy
//! mutation, so a bad spec never leaves a half-written batch behind.

use crate::config::ConfigError;
use crate::manifest::ManifestError;
use mosaic_model::{IdError, SpecError};
use mosaic_scope::ScopeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Component, version, or dependency that does not exist.
    #[error("{subject} not found")]
    NotFound { subject: String },

    /// A component that exists but cannot be loaded as-is.
    #[error("component `{id}` is invalid: {reason}")]
    InvalidComponent { id: String, reason: String },

    /// Contradictory configuration surfaced in strict mode.
    #[error("config conflict on `{id}`, field `{field}`: {reason}")]
    ConfigConflict { id: String, field: String, reason: String },

    /// Unparsable package spec. Always fatal.
    #[error(transparent)]
    MalformedSpec(#[from] SpecError),

    /// Unparsable component id. Always fatal, like a malformed spec.
    #[error(transparent)]
    InvalidId(#[from] IdError),

    /// Malformed component pattern. Always fatal.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The operation needs a workspace and none is here.
    #[error("no workspace found here or in any parent directory")]
    OutsideContext,

    #[error(transparent)]
    Scope(ScopeError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WorkspaceError {
    pub fn not_found(subject: impl Into<String>) -> Self {
        WorkspaceError::NotFound { subject: subject.into() }
    }

    pub fn invalid_component(id: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        WorkspaceError::InvalidComponent { id: id.to_string(), reason: reason.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkspaceError::NotFound { .. })
    }

    pub fn is_invalid_component(&self) -> bool {
        matches!(self, WorkspaceError::InvalidComponent { .. })
    }

    /// Whether a batch may record this failure and keep going.
    pub fn is_recoverable(&self) -> bool {
        self.is_not_found() || self.is_invalid_component()
    }
}

/// Scope misses are "not found" to callers; real storage failures stay
/// storage failures.
impl From<ScopeError> for WorkspaceError {
    fn from(e: ScopeError) -> Self {
        match e {
            ScopeError::SnapshotNotFound { hash } => {
                WorkspaceError::not_found(format!("snapshot `{hash}`"))
            }
            ScopeError::BlobNotFound { hash } => {
                WorkspaceError::not_found(format!("file blob `{hash}`"))
            }
            ScopeError::UnknownComponent { id } => {
                WorkspaceError::not_found(format!("component `{id}`"))
            }
            ScopeError::UnknownTag { id, tag } => {
                WorkspaceError::not_found(format!("version `{tag}` of `{id}`"))
            }
            ScopeError::NotInHistory { id, hash } => {
                WorkspaceError::not_found(format!("snapshot `{hash}` of `{id}`"))
            }
            other => WorkspaceError::Scope(other),
        }
    }
}
