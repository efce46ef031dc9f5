use crate::manifest::{
    Dependency, DependencyGroup, DetailedDependency, ManifestError, Pipfile, RequiresSection,
    SourceEntry,
};
use crate::requirement::{
    is_valid_interpreter_version, normalize_name, parse_constraint, validate_name,
    VersionConstraint,
};
use crate::types::{PackageName, SourceName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Canonical, sorted, deduplicated representation of a parsed Pipfile.
///
/// Package names are in normalized form, constraints are parsed, all
/// structural invariants have been checked. This is the input to identity
/// hashing, lock verification, and canonical formatting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedPipfile {
    pub sources: Vec<NormalizedSource>,
    pub packages: Vec<NormalizedDependency>,
    pub dev_packages: Vec<NormalizedDependency>,
    pub python_version: Option<String>,
    pub python_full_version: Option<String>,
    pub scripts: Vec<(String, String)>,
}

/// A validated registry source entry. Order follows the manifest: the first
/// source is the default index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedSource {
    pub name: SourceName,
    pub url: String,
    pub verify_ssl: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedDependency {
    /// PEP 503 normalized name; unique within its group.
    pub name: PackageName,
    /// The name as written in the manifest. Display-only: excluded from the
    /// canonical form so spelling variants do not change identity.
    #[serde(skip)]
    pub raw_name: String,
    pub constraint: VersionConstraint,
    pub extras: Vec<String>,
    pub markers: Option<String>,
    pub index: Option<SourceName>,
}

impl Pipfile {
    /// Normalize the manifest: validate sources, names, constraints, and the
    /// interpreter requirement; sort and dedup-check both dependency groups.
    pub fn normalize(&self) -> Result<NormalizedPipfile, ManifestError> {
        let sources = normalize_sources(&self.source)?;
        let source_names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();

        let packages = normalize_group(&self.packages, "packages", &source_names)?;
        let dev_packages = normalize_group(&self.dev_packages, "dev-packages", &source_names)?;
        check_cross_group(&packages, &dev_packages)?;

        let requires = normalize_requires(&self.requires)?;

        let mut scripts: Vec<(String, String)> = self
            .scripts
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        scripts.sort();

        Ok(NormalizedPipfile {
            sources,
            packages,
            dev_packages,
            python_version: requires.python_version,
            python_full_version: requires.python_full_version,
            scripts,
        })
    }
}

impl NormalizedPipfile {
    /// Canonical JSON text, used as the identity-hash input. Infallible:
    /// every key in this structure is a struct field name.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).expect("normalized manifest serializes to JSON")
    }

    /// Rebuild a manifest in canonical form: normalized names, canonical
    /// constraint strings, sorted entries.
    pub fn to_manifest(&self) -> Pipfile {
        Pipfile {
            source: self
                .sources
                .iter()
                .map(|s| SourceEntry {
                    url: s.url.clone(),
                    verify_ssl: s.verify_ssl,
                    name: s.name.to_string(),
                })
                .collect(),
            packages: rebuild_group(&self.packages),
            dev_packages: rebuild_group(&self.dev_packages),
            requires: RequiresSection {
                python_version: self.python_version.clone(),
                python_full_version: self.python_full_version.clone(),
            },
            scripts: crate::manifest::ScriptsSection {
                entries: self.scripts.iter().cloned().collect(),
            },
        }
    }

    /// Canonical TOML text. Parsing this output and normalizing again yields
    /// a structure equal to `self`.
    pub fn canonical_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&self.to_manifest())
    }
}

fn normalize_sources(sources: &[SourceEntry]) -> Result<Vec<NormalizedSource>, ManifestError> {
    if sources.is_empty() {
        return Err(ManifestError::NoSources);
    }
    let mut out = Vec::with_capacity(sources.len());
    let mut seen: Vec<String> = Vec::new();
    for entry in sources {
        let name = entry.name.trim().to_owned();
        if name.is_empty() {
            return Err(ManifestError::EmptySourceName);
        }
        if seen.contains(&name) {
            return Err(ManifestError::DuplicateSourceName(name));
        }
        let url = entry.url.trim().to_owned();
        validate_source_url(&name, &url)?;
        seen.push(name.clone());
        out.push(NormalizedSource {
            name: SourceName::new(name),
            url,
            verify_ssl: entry.verify_ssl,
        });
    }
    Ok(out)
}

fn validate_source_url(name: &str, raw: &str) -> Result<(), ManifestError> {
    let invalid = |reason: String| ManifestError::InvalidSourceUrl {
        name: name.to_owned(),
        url: raw.to_owned(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(())
}

fn normalize_group(
    group: &DependencyGroup,
    group_name: &'static str,
    source_names: &[&str],
) -> Result<Vec<NormalizedDependency>, ManifestError> {
    let mut by_name: BTreeMap<String, NormalizedDependency> = BTreeMap::new();
    for (raw_name, dep) in &group.entries {
        validate_name(raw_name).map_err(|source| ManifestError::InvalidPackageName {
            name: raw_name.clone(),
            source,
        })?;
        let name = normalize_name(raw_name);

        let normalized = normalize_dependency(raw_name, &name, dep, source_names)?;

        if let Some(existing) = by_name.get(&name) {
            return Err(ManifestError::DuplicatePackage {
                group: group_name,
                first: existing.raw_name.clone(),
                second: raw_name.clone(),
            });
        }
        by_name.insert(name, normalized);
    }
    Ok(by_name.into_values().collect())
}

fn normalize_dependency(
    raw_name: &str,
    name: &str,
    dep: &Dependency,
    source_names: &[&str],
) -> Result<NormalizedDependency, ManifestError> {
    let parse = |raw: &str| {
        parse_constraint(raw).map_err(|source| ManifestError::InvalidConstraint {
            name: raw_name.to_owned(),
            constraint: raw.to_owned(),
            source,
        })
    };

    match dep {
        Dependency::Spec(raw) => Ok(NormalizedDependency {
            name: PackageName::new(name),
            raw_name: raw_name.to_owned(),
            constraint: parse(raw)?,
            extras: Vec::new(),
            markers: None,
            index: None,
        }),
        Dependency::Detailed(d) => {
            if d.version.is_none() && d.extras.is_empty() && d.markers.is_none() && d.index.is_none()
            {
                return Err(ManifestError::EmptyDependencyTable(raw_name.to_owned()));
            }
            let constraint = match &d.version {
                Some(raw) => parse(raw)?,
                None => VersionConstraint::Any,
            };
            let index = match &d.index {
                Some(index) => {
                    let trimmed = index.trim();
                    if !source_names.contains(&trimmed) {
                        return Err(ManifestError::UnknownIndex {
                            name: raw_name.to_owned(),
                            index: index.clone(),
                        });
                    }
                    Some(SourceName::new(trimmed))
                }
                None => None,
            };
            let mut extras: Vec<String> = d.extras.iter().map(|e| normalize_name(e)).collect();
            extras.sort();
            extras.dedup();
            Ok(NormalizedDependency {
                name: PackageName::new(name),
                raw_name: raw_name.to_owned(),
                constraint,
                extras,
                markers: d.markers.as_ref().map(|m| m.trim().to_owned()),
                index,
            })
        }
    }
}

/// A package may appear in both groups only when the constraints agree:
/// identical after parsing, or at least one side unconstrained.
fn check_cross_group(
    packages: &[NormalizedDependency],
    dev_packages: &[NormalizedDependency],
) -> Result<(), ManifestError> {
    for dev in dev_packages {
        let Some(run) = packages.iter().find(|p| p.name == dev.name) else {
            continue;
        };
        if run.constraint.is_any() || dev.constraint.is_any() || run.constraint == dev.constraint {
            continue;
        }
        return Err(ManifestError::ConflictingConstraint {
            name: dev.name.to_string(),
            runtime: run.constraint.to_string(),
            develop: dev.constraint.to_string(),
        });
    }
    Ok(())
}

fn normalize_requires(requires: &RequiresSection) -> Result<RequiresSection, ManifestError> {
    let check = |key: &'static str, value: &Option<String>| -> Result<Option<String>, ManifestError> {
        match value {
            None => Ok(None),
            Some(v) => {
                let trimmed = v.trim().to_owned();
                if is_valid_interpreter_version(&trimmed) {
                    Ok(Some(trimmed))
                } else {
                    Err(ManifestError::InvalidInterpreterVersion {
                        key,
                        value: v.clone(),
                    })
                }
            }
        }
    };
    Ok(RequiresSection {
        python_version: check("python_version", &requires.python_version)?,
        python_full_version: check("python_full_version", &requires.python_full_version)?,
    })
}

fn rebuild_group(deps: &[NormalizedDependency]) -> DependencyGroup {
    let mut entries = BTreeMap::new();
    for dep in deps {
        let value = if dep.extras.is_empty() && dep.markers.is_none() && dep.index.is_none() {
            Dependency::Spec(dep.constraint.to_string())
        } else {
            Dependency::Detailed(DetailedDependency {
                version: Some(dep.constraint.to_string()),
                extras: dep.extras.clone(),
                markers: dep.markers.clone(),
                index: dep.index.as_ref().map(ToString::to_string),
            })
        };
        entries.insert(dep.name.to_string(), value);
    }
    DependencyGroup { entries }
}
