//! Component patterns: comma-separated globs with `!` exclusions.
//!
//! `*` is the only wildcard. A pattern matches against the id without
//! version (`scope/name`) and against the bare name, so `button`
//! matches `acme/button`. A list with only exclusions starts from
//! match-all.

use mosaic_model::ComponentId;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid pattern `{pattern}`: {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct IdPattern {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl IdPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for raw in pattern.split(',') {
            let glob = raw.trim();
            if glob.is_empty() {
                continue;
            }
            match glob.strip_prefix('!') {
                Some(negated) => excludes.push(glob_to_regex(pattern, negated)?),
                None => includes.push(glob_to_regex(pattern, glob)?),
            }
        }
        if includes.is_empty() && excludes.is_empty() {
            return Err(PatternError {
                pattern: pattern.to_string(),
                reason: "empty pattern".to_string(),
            });
        }
        Ok(IdPattern { includes, excludes })
    }

    pub fn matches(&self, id: &ComponentId) -> bool {
        let full = id.to_string_no_version();
        let hit = |regexes: &[Regex]| {
            regexes.iter().any(|re| re.is_match(&full) || re.is_match(&id.name))
        };
        let included = self.includes.is_empty() || hit(&self.includes);
        included && !hit(&self.excludes)
    }
}

fn glob_to_regex(pattern: &str, glob: &str) -> Result<Regex, PatternError> {
    let mut source = String::with_capacity(glob.len() + 8);
    source.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => source.push_str(".*"),
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');
    Regex::new(&source)
        .map_err(|e| PatternError { pattern: pattern.to_string(), reason: e.to_string() })
}
