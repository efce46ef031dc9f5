use crate::requirement::RequirementError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("manifest declares no [[source]] entry")]
    NoSources,
    #[error("source name must not be empty")]
    EmptySourceName,
    #[error("duplicate source name '{0}'")]
    DuplicateSourceName(String),
    #[error("source '{name}' has an invalid url '{url}': {reason}")]
    InvalidSourceUrl {
        name: String,
        url: String,
        reason: String,
    },
    #[error("invalid name for package '{name}': {source}")]
    InvalidPackageName {
        name: String,
        source: RequirementError,
    },
    #[error("invalid constraint '{constraint}' for package '{name}': {source}")]
    InvalidConstraint {
        name: String,
        constraint: String,
        source: RequirementError,
    },
    #[error("dependency table for '{0}' is empty (expected at least a 'version' key)")]
    EmptyDependencyTable(String),
    #[error("package '{second}' duplicates '{first}' in [{group}] (names are equivalent after normalization)")]
    DuplicatePackage {
        group: &'static str,
        first: String,
        second: String,
    },
    #[error("package '{name}' references undeclared source index '{index}'")]
    UnknownIndex { name: String, index: String },
    #[error("package '{name}' has conflicting constraints: '{runtime}' in [packages] vs '{develop}' in [dev-packages]")]
    ConflictingConstraint {
        name: String,
        runtime: String,
        develop: String,
    },
    #[error("invalid {key} requirement '{value}' (expected a dotted numeric version)")]
    InvalidInterpreterVersion { key: &'static str, value: String },
}

/// A parsed Pipfile. Field order mirrors the conventional section order.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Pipfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<SourceEntry>,
    #[serde(default)]
    pub packages: DependencyGroup,
    #[serde(default, rename = "dev-packages")]
    pub dev_packages: DependencyGroup,
    #[serde(default, skip_serializing_if = "RequiresSection::is_empty")]
    pub requires: RequiresSection,
    #[serde(default, skip_serializing_if = "ScriptsSection::is_empty")]
    pub scripts: ScriptsSection,
}

/// One `[[source]]` registry entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub url: String,
    pub verify_ssl: bool,
    pub name: String,
}

/// A `[packages]` or `[dev-packages]` table. TOML key uniqueness guarantees
/// raw names are unique here; equivalence after normalization is checked later.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DependencyGroup {
    #[serde(flatten)]
    pub entries: BTreeMap<String, Dependency>,
}

/// A dependency value: either a constraint string or a detailed table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Dependency {
    Spec(String),
    Detailed(DetailedDependency),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DetailedDependency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RequiresSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_full_version: Option<String>,
}

impl RequiresSection {
    pub fn is_empty(&self) -> bool {
        self.python_version.is_none() && self.python_full_version.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ScriptsSection {
    #[serde(flatten)]
    pub entries: BTreeMap<String, String>,
}

impl ScriptsSection {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn parse_pipfile_str(input: &str) -> Result<Pipfile, ManifestError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_pipfile_file(path: impl AsRef<Path>) -> Result<Pipfile, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_pipfile_str(&content)
}
