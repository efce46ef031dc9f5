//! Package-name normalization and the version-specifier grammar.
//!
//! Names follow PEP 503: comparison is case-insensitive and runs of `-`, `_`,
//! and `.` are equivalent. Specifiers cover the PEP 440 operators that appear
//! in manifests (`==`, `!=`, `>=`, `<=`, `>`, `<`, `~=`, `===`) plus the bare
//! wildcard `*` meaning "any version".

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequirementError {
    #[error("package name must not be empty")]
    EmptyName,
    #[error("invalid character '{ch}' in package name '{name}'")]
    InvalidNameChar { name: String, ch: char },
    #[error("package name '{0}' must start and end with a letter or digit")]
    BadNameBoundary(String),
    #[error("version constraint must not be empty")]
    EmptyConstraint,
    #[error("missing comparison operator in '{0}' (expected e.g. '==1.2' or '>=1.0')")]
    MissingOperator(String),
    #[error("invalid version '{0}'")]
    InvalidVersion(String),
}

/// Normalize a package name per PEP 503.
///
/// Assumes the name already passed [`validate_name`]; this only folds case
/// and separator runs.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;
    for ch in raw.trim().chars() {
        if ch == '-' || ch == '_' || ch == '.' {
            if !last_was_sep {
                out.push('-');
            }
            last_was_sep = true;
        } else {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        }
    }
    out
}

/// Check that a raw package name is syntactically valid (PEP 508 name grammar).
pub fn validate_name(raw: &str) -> Result<(), RequirementError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RequirementError::EmptyName);
    }
    for ch in name.chars() {
        if !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.') {
            return Err(RequirementError::InvalidNameChar {
                name: name.to_owned(),
                ch,
            });
        }
    }
    let first = name.chars().next().unwrap_or('-');
    let last = name.chars().last().unwrap_or('-');
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err(RequirementError::BadNameBoundary(name.to_owned()));
    }
    Ok(())
}

/// A single comparison clause, e.g. `>=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VersionOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `~=` (compatible release)
    Compatible,
    /// `===` (arbitrary string equality)
    Arbitrary,
}

impl VersionOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Compatible => "~=",
            Self::Arbitrary => "===",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Specifier {
    pub op: VersionOp,
    pub version: String,
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// A parsed version constraint: either the wildcard or a conjunction of clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionConstraint {
    Any,
    Specifiers(Vec<Specifier>),
}

impl VersionConstraint {
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Whether a concrete version satisfies every clause of this constraint.
    pub fn satisfied_by(&self, version: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Specifiers(specs) => specs.iter().all(|s| clause_satisfied(s, version)),
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Specifiers(specs) => {
                for (i, spec) in specs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{spec}")?;
                }
                Ok(())
            }
        }
    }
}

/// Parse a constraint string: `*`, or comma-separated specifier clauses.
pub fn parse_constraint(raw: &str) -> Result<VersionConstraint, RequirementError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RequirementError::EmptyConstraint);
    }
    if raw == "*" {
        return Ok(VersionConstraint::Any);
    }

    let mut specs = Vec::new();
    for clause in raw.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            return Err(RequirementError::MissingOperator(raw.to_owned()));
        }
        let (op, rest) = split_operator(clause)
            .ok_or_else(|| RequirementError::MissingOperator(clause.to_owned()))?;
        let version = rest.trim();
        let wildcard_ok = matches!(op, VersionOp::Eq | VersionOp::Ne);
        if !is_valid_version(version, wildcard_ok) {
            return Err(RequirementError::InvalidVersion(version.to_owned()));
        }
        specs.push(Specifier {
            op,
            version: version.to_owned(),
        });
    }
    specs.sort();
    specs.dedup();
    Ok(VersionConstraint::Specifiers(specs))
}

fn split_operator(clause: &str) -> Option<(VersionOp, &str)> {
    // Longest operators first: `===` before `==`, `~=` before nothing.
    for (text, op) in [
        ("===", VersionOp::Arbitrary),
        ("==", VersionOp::Eq),
        ("!=", VersionOp::Ne),
        (">=", VersionOp::Ge),
        ("<=", VersionOp::Le),
        (">", VersionOp::Gt),
        ("<", VersionOp::Lt),
        ("~=", VersionOp::Compatible),
    ] {
        if let Some(rest) = clause.strip_prefix(text) {
            return Some((op, rest));
        }
    }
    None
}

/// Validate a version string: dot-separated release segments, optionally with
/// a pre/post/dev/local suffix, optionally ending in `.*` when `wildcard_ok`.
pub fn is_valid_version(raw: &str, wildcard_ok: bool) -> bool {
    let mut s = raw.trim();
    if s.is_empty() {
        return false;
    }
    if wildcard_ok {
        s = s.strip_suffix(".*").unwrap_or(s);
    }
    if s.is_empty() {
        return false;
    }
    let Some(first) = s.chars().next() else {
        return false;
    };
    if !first.is_ascii_digit() && first != 'v' {
        return false;
    }
    let Some(last) = s.chars().last() else {
        return false;
    };
    if !last.is_ascii_alphanumeric() {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '!' | '+' | '-' | '_'))
}

/// Validate an interpreter version requirement such as `3.7` or `3.11.2`.
///
/// Stricter than package versions: only dotted numeric segments are accepted.
pub fn is_valid_interpreter_version(raw: &str) -> bool {
    let s = raw.trim();
    !s.is_empty()
        && s.split('.')
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()))
}

/// Release segments of a version, e.g. `1.26.0` → `[1, 26, 0]`.
///
/// Parsing stops at the first non-numeric segment, so `1.2rc1` yields `[1]`
/// with a non-empty tail. Good enough for the ordering checks lock
/// verification needs; full PEP 440 total ordering is not attempted.
fn release_segments(version: &str) -> Vec<u64> {
    let v = version.trim().strip_prefix('v').unwrap_or(version.trim());
    let mut out = Vec::new();
    for seg in v.split('.') {
        match seg.parse::<u64>() {
            Ok(n) => out.push(n),
            Err(_) => break,
        }
    }
    out
}

fn compare_releases(a: &str, b: &str) -> std::cmp::Ordering {
    let (mut left, mut right) = (release_segments(a), release_segments(b));
    let width = left.len().max(right.len());
    left.resize(width, 0);
    right.resize(width, 0);
    left.cmp(&right)
}

fn prefix_matches(pattern: &str, version: &str) -> bool {
    let wanted = release_segments(pattern.trim_end_matches(".*"));
    let actual = release_segments(version);
    actual.len() >= wanted.len() && actual[..wanted.len()] == wanted[..]
}

fn clause_satisfied(spec: &Specifier, version: &str) -> bool {
    use std::cmp::Ordering;
    match spec.op {
        VersionOp::Arbitrary => spec.version.trim() == version.trim(),
        VersionOp::Eq => {
            if spec.version.ends_with(".*") {
                prefix_matches(&spec.version, version)
            } else {
                compare_releases(version, &spec.version) == Ordering::Equal
            }
        }
        VersionOp::Ne => {
            if spec.version.ends_with(".*") {
                !prefix_matches(&spec.version, version)
            } else {
                compare_releases(version, &spec.version) != Ordering::Equal
            }
        }
        VersionOp::Ge => compare_releases(version, &spec.version) != Ordering::Less,
        VersionOp::Le => compare_releases(version, &spec.version) != Ordering::Greater,
        VersionOp::Gt => compare_releases(version, &spec.version) == Ordering::Greater,
        VersionOp::Lt => compare_releases(version, &spec.version) == Ordering::Less,
        VersionOp::Compatible => {
            // ~=X.Y means >=X.Y and ==X.*
            let floor = compare_releases(version, &spec.version) != Ordering::Less;
            let segs = release_segments(&spec.version);
            if segs.len() < 2 {
                return floor;
            }
            let prefix: Vec<String> = segs[..segs.len() - 1].iter().map(u64::to_string).collect();
            floor && prefix_matches(&format!("{}.*", prefix.join(".")), version)
        }
    }
}
