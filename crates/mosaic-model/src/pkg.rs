//! Package spec parsing: `name[@version]`, with scoped `@scope/name` names.

use thiserror::Error;

pub const LATEST: &str = "latest";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid package spec `{spec}`: {reason}")]
pub struct SpecError {
    pub spec: String,
    pub reason: String,
}

impl SpecError {
    fn new(spec: &str, reason: impl Into<String>) -> Self {
        SpecError { spec: spec.to_string(), reason: reason.into() }
    }
}

/// The name part of `name[@version]`, leaving a leading `@scope/`
/// marker alone.
pub fn strip_version_suffix(s: &str) -> &str {
    let start = usize::from(s.starts_with('@'));
    match s[start..].find('@') {
        Some(pos) => &s[..start + pos],
        None => s,
    }
}

/// A parsed `name[@version]` request. The name is a package name or a
/// component id string; a missing version (or the literal `latest`)
/// means "resolve the latest" at the point of use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: Option<String>,
}

impl PackageSpec {
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        if spec.is_empty() {
            return Err(SpecError::new(spec, "empty spec"));
        }
        let parts: Vec<&str> = spec.split('@').collect();
        let (name, version) = if spec.starts_with('@') {
            // parts[0] is the empty lead-in before the scope marker
            match parts.len() {
                2 => (format!("@{}", parts[1]), None),
                3 => (format!("@{}", parts[1]), Some(parts[2])),
                _ => return Err(SpecError::new(spec, "at most one version suffix is allowed")),
            }
        } else {
            match parts.len() {
                1 => (parts[0].to_string(), None),
                2 => (parts[0].to_string(), Some(parts[1])),
                _ => return Err(SpecError::new(spec, "at most one version suffix is allowed")),
            }
        };
        if name == "@" || name.is_empty() {
            return Err(SpecError::new(spec, "empty package name"));
        }
        if let Some(v) = version {
            if v.is_empty() {
                return Err(SpecError::new(spec, "empty version suffix"));
            }
        }
        Ok(PackageSpec { name, version: version.map(str::to_string) })
    }

    /// Parse a whole batch up front, so a malformed spec fails the batch
    /// before anything else runs.
    pub fn parse_all(specs: &[String]) -> Result<Vec<PackageSpec>, SpecError> {
        specs.iter().map(|s| PackageSpec::parse(s)).collect()
    }

    pub fn wants_latest(&self) -> bool {
        match &self.version {
            None => true,
            Some(v) => v == LATEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_name() {
        let spec = PackageSpec::parse("lodash").expect("valid spec");
        assert_eq!(spec.name, "lodash");
        assert_eq!(spec.version, None);
        assert!(spec.wants_latest());
    }

    #[test]
    fn parses_plain_name_with_version() {
        let spec = PackageSpec::parse("lodash@4.17.21").expect("valid spec");
        assert_eq!(spec.name, "lodash");
        assert_eq!(spec.version.as_deref(), Some("4.17.21"));
        assert!(!spec.wants_latest());
    }

    #[test]
    fn parses_scoped_name() {
        let spec = PackageSpec::parse("@acme/tokens").expect("valid spec");
        assert_eq!(spec.name, "@acme/tokens");
        assert_eq!(spec.version, None);
    }

    #[test]
    fn parses_scoped_name_with_version() {
        let spec = PackageSpec::parse("@acme/tokens@2.0.0").expect("valid spec");
        assert_eq!(spec.name, "@acme/tokens");
        assert_eq!(spec.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn latest_literal_wants_latest() {
        let spec = PackageSpec::parse("lodash@latest").expect("valid spec");
        assert!(spec.wants_latest());
    }

    #[test]
    fn rejects_double_version_suffix() {
        assert!(PackageSpec::parse("pkg@1@2").is_err());
        assert!(PackageSpec::parse("@acme/pkg@1@2").is_err());
    }

    #[test]
    fn rejects_empty_pieces() {
        assert!(PackageSpec::parse("").is_err());
        assert!(PackageSpec::parse("@").is_err());
        assert!(PackageSpec::parse("pkg@").is_err());
    }

    #[test]
    fn parse_all_fails_on_first_bad_spec() {
        let specs = vec!["ok@1.0.0".to_string(), "bad@1@2".to_string()];
        let err = PackageSpec::parse_all(&specs).expect_err("must fail");
        assert_eq!(err.spec, "bad@1@2");
    }

    #[test]
    fn strips_version_suffix_from_plain_and_scoped_names() {
        assert_eq!(strip_version_suffix("lodash@4.17.21"), "lodash");
        assert_eq!(strip_version_suffix("lodash"), "lodash");
        assert_eq!(strip_version_suffix("@acme/tokens@2.0.0"), "@acme/tokens");
        assert_eq!(strip_version_suffix("@acme/tokens"), "@acme/tokens");
        assert_eq!(strip_version_suffix("acme/ui/button@1.0.0"), "acme/ui/button");
    }
}
