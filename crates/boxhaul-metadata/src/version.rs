//! Box version ordering and constraint matching.
//!
//! Box versions are dotted numeric strings (`0.7`, `1.2.3`) with an optional
//! prerelease tag (`1.0.0-rc1`, `1.0.0.beta2`). They are not semver: any
//! number of segments is accepted and missing segments compare as zero.

use crate::error::MetadataError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v?(?<segments>[0-9]+(?:\.[0-9]+)*)(?:[.-](?<pre>[A-Za-z][0-9A-Za-z.-]*))?$")
        .unwrap()
});

static CONSTRAINT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?<op>>=|<=|~>|>|<|=)?\s*(?<version>\S+)$").unwrap());

#[derive(Debug, Clone)]
pub struct BoxVersion {
    segments: Vec<u64>,
    pre: Option<String>,
    raw: String,
}

impl BoxVersion {
    pub fn parse(s: &str) -> Result<Self, MetadataError> {
        let trimmed = s.trim();
        let caps = VERSION_REGEX
            .captures(trimmed)
            .ok_or_else(|| MetadataError::Version(s.to_string()))?;

        let segments = caps["segments"]
            .split('.')
            .map(|seg| seg.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| MetadataError::Version(s.to_string()))?;

        Ok(Self {
            segments,
            pre: caps.name("pre").map(|m| m.as_str().to_string()),
            raw: trimmed.to_string(),
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }

    /// Upper bound for a pessimistic (`~>`) constraint: the next release of
    /// the second-to-last segment. `~> 1.2.3` allows `< 1.3`; `~> 2` allows
    /// `< 3`.
    fn pessimistic_ceiling(&self) -> Self {
        let mut segments = self.segments.clone();
        if segments.len() > 1 {
            segments.pop();
        }
        if let Some(last) = segments.last_mut() {
            *last += 1;
        }
        let raw = segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self {
            segments,
            pre: None,
            raw,
        }
    }
}

impl Ord for BoxVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        // A release sorts above any prerelease of the same number.
        match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for BoxVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality follows the ordering, so that `1.0` and `1.0.0` are the same
// version even though they read differently.
impl PartialEq for BoxVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BoxVersion {}

impl FromStr for BoxVersion {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoxVersion::parse(s)
    }
}

impl fmt::Display for BoxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Pessimistic,
}

/// A conjunction of version constraint terms, e.g. `">= 1.0, < 2.0"`.
/// An empty constraint matches any version.
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    terms: Vec<(ConstraintOp, BoxVersion)>,
    raw: String,
}

impl VersionConstraint {
    pub fn any() -> Self {
        Self {
            terms: Vec::new(),
            raw: String::new(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, MetadataError> {
        let mut terms = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let caps = CONSTRAINT_REGEX
                .captures(part)
                .ok_or_else(|| MetadataError::Constraint(s.to_string()))?;
            let op = match caps.name("op").map(|m| m.as_str()) {
                None | Some("=") => ConstraintOp::Eq,
                Some(">") => ConstraintOp::Gt,
                Some("<") => ConstraintOp::Lt,
                Some(">=") => ConstraintOp::Ge,
                Some("<=") => ConstraintOp::Le,
                Some("~>") => ConstraintOp::Pessimistic,
                Some(_) => unreachable!("constraint regex admits no other operator"),
            };
            let version = BoxVersion::parse(&caps["version"])
                .map_err(|_| MetadataError::Constraint(s.to_string()))?;
            terms.push((op, version));
        }
        Ok(Self {
            terms,
            raw: s.trim().to_string(),
        })
    }

    pub fn is_any(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, candidate: &BoxVersion) -> bool {
        self.terms.iter().all(|(op, bound)| match op {
            ConstraintOp::Eq => candidate == bound,
            ConstraintOp::Gt => candidate > bound,
            ConstraintOp::Lt => candidate < bound,
            ConstraintOp::Ge => candidate >= bound,
            ConstraintOp::Le => candidate <= bound,
            ConstraintOp::Pessimistic => {
                candidate >= bound && candidate < &bound.pessimistic_ceiling()
            }
        })
    }
}

impl Default for VersionConstraint {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.is_empty() {
            f.write_str(">= 0")
        } else {
            f.write_str(&self.raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> BoxVersion {
        BoxVersion::parse(s).unwrap()
    }

    #[test]
    fn test_version_parse_two_segments() {
        let parsed = v("0.7");
        assert!(!parsed.is_prerelease());
        assert_eq!(parsed.to_string(), "0.7");
    }

    #[test]
    fn test_version_parse_prerelease() {
        assert!(v("1.0.0-rc1").is_prerelease());
        assert!(v("1.0.0.beta2").is_prerelease());
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(BoxVersion::parse("").is_err());
        assert!(BoxVersion::parse("abc").is_err());
        assert!(BoxVersion::parse("1..2").is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(v("0.7") > v("0.5"));
        assert!(v("1.10") > v("1.9"));
        assert!(v("1.0") == v("1.0.0"));
        assert!(v("1.0.0-rc1") < v("1.0.0"));
    }

    #[test]
    fn test_constraint_any() {
        let constraint = VersionConstraint::any();
        assert!(constraint.matches(&v("0.0.1")));
        assert!(constraint.matches(&v("99.99")));
    }

    #[test]
    fn test_constraint_exact() {
        let constraint = VersionConstraint::parse("1.2.3").unwrap();
        assert!(constraint.matches(&v("1.2.3")));
        assert!(!constraint.matches(&v("1.2.4")));
    }

    #[test]
    fn test_constraint_range() {
        let constraint = VersionConstraint::parse(">= 1.0, < 2.0").unwrap();
        assert!(constraint.matches(&v("1.5")));
        assert!(!constraint.matches(&v("0.9")));
        assert!(!constraint.matches(&v("2.0")));
    }

    #[test]
    fn test_constraint_pessimistic() {
        let constraint = VersionConstraint::parse("~> 1.2.3").unwrap();
        assert!(constraint.matches(&v("1.2.3")));
        assert!(constraint.matches(&v("1.2.9")));
        assert!(!constraint.matches(&v("1.3.0")));

        let major = VersionConstraint::parse("~> 2").unwrap();
        assert!(major.matches(&v("2.9")));
        assert!(!major.matches(&v("3.0")));
    }

    #[test]
    fn test_constraint_invalid() {
        assert!(VersionConstraint::parse(">=").is_err());
        assert!(VersionConstraint::parse("one.two").is_err());
    }

    #[test]
    fn test_constraint_display() {
        assert_eq!(VersionConstraint::any().to_string(), ">= 0");
        assert_eq!(
            VersionConstraint::parse(">= 1.0, < 2.0").unwrap().to_string(),
            ">= 1.0, < 2.0"
        );
    }
}
