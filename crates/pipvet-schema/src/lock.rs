use crate::manifest::ManifestError;
use crate::normalize::{NormalizedDependency, NormalizedPipfile, NormalizedSource};
use crate::types::{LockId, ShortId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("lock file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lock file parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported lock_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("lock file lock_id mismatch: lock has '{lock_id}', recomputed '{computed_id}'")]
    LockIdMismatch {
        lock_id: String,
        computed_id: String,
    },
    #[error("lock file manifest drift: {0}")]
    ManifestDrift(String),
}

/// A package pinned to an exact version, optionally with artifact hashes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<String>,
}

/// Result of resolving a manifest's dependency groups against a registry.
///
/// Resolution itself happens outside this crate; this is the handoff shape.
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    pub default: Vec<LockedPackage>,
    pub develop: Vec<LockedPackage>,
}

/// The lock file captures the fully resolved state of a manifest.
///
/// The lock_id is computed deterministically from the locked fields:
/// same lock content → same lock_id → same environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockFile {
    pub lock_version: u32,
    pub lock_id: String,
    pub short_id: String,

    /// Fingerprint of the manifest this lock was generated from.
    pub manifest_id: String,

    pub sources: Vec<NormalizedSource>,

    /// Pinned runtime packages (sorted by name).
    pub default: Vec<LockedPackage>,
    /// Pinned development packages (sorted by name).
    pub develop: Vec<LockedPackage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_full_version: Option<String>,
}

impl LockFile {
    /// Generate a lock file from a normalized manifest and resolution results.
    pub fn from_resolved(normalized: &NormalizedPipfile, resolution: &ResolutionResult) -> Self {
        let identity = crate::identity::compute_manifest_id(normalized);
        let mut default = resolution.default.clone();
        let mut develop = resolution.develop.clone();
        default.sort();
        develop.sort();

        let lock = LockFile {
            lock_version: 1,
            lock_id: String::new(), // computed below
            short_id: String::new(),
            manifest_id: identity.manifest_id.into_inner(),
            sources: normalized.sources.clone(),
            default,
            develop,
            python_version: normalized.python_version.clone(),
            python_full_version: normalized.python_full_version.clone(),
        };

        let (lock_id, short_id) = lock.compute_identity();
        LockFile {
            lock_id: lock_id.into_inner(),
            short_id: short_id.into_inner(),
            ..lock
        }
    }

    /// Compute the lock identity from the locked state.
    ///
    /// Uses only pinned data: exact versions, artifact hashes, sources, and
    /// the interpreter requirement. The manifest_id is deliberately excluded
    /// so that a re-resolve producing identical pins keeps the same lock_id.
    pub fn compute_identity(&self) -> (LockId, ShortId) {
        let mut hasher = blake3::Hasher::new();

        for source in &self.sources {
            hasher.update(
                format!("src:{}:{}:{}", source.name, source.url, source.verify_ssl).as_bytes(),
            );
        }
        for pkg in &self.default {
            hasher.update(locked_line("pkg", pkg).as_bytes());
        }
        for pkg in &self.develop {
            hasher.update(locked_line("dev", pkg).as_bytes());
        }
        if let Some(py) = &self.python_version {
            hasher.update(format!("py:{py}").as_bytes());
        }
        if let Some(py) = &self.python_full_version {
            hasher.update(format!("pyfull:{py}").as_bytes());
        }

        let hex = hasher.finalize().to_hex().to_string();
        let short = hex[..12].to_owned();
        (LockId::new(hex), ShortId::new(short))
    }

    /// Verify that this lock file is internally consistent
    /// (stored lock_id matches recomputed lock_id).
    pub fn verify_integrity(&self) -> Result<(), LockError> {
        if self.lock_version != 1 {
            return Err(LockError::UnsupportedVersion(self.lock_version));
        }
        let (lock_id, _) = self.compute_identity();
        if self.lock_id != lock_id.as_str() {
            return Err(LockError::LockIdMismatch {
                lock_id: self.lock_id.clone(),
                computed_id: lock_id.into_inner(),
            });
        }
        Ok(())
    }

    /// Check that a manifest's declared intent matches this lock file.
    ///
    /// Catches the cases where the manifest changed but the lock wasn't
    /// regenerated: sources edited, interpreter requirement changed, a
    /// declared package missing from the lock, or a locked version that no
    /// longer satisfies its constraint.
    pub fn verify_manifest_intent(&self, normalized: &NormalizedPipfile) -> Result<(), LockError> {
        if self.sources != normalized.sources {
            return Err(LockError::ManifestDrift(
                "registry sources changed since the lock was generated".to_owned(),
            ));
        }
        if self.python_version != normalized.python_version
            || self.python_full_version != normalized.python_full_version
        {
            return Err(LockError::ManifestDrift(format!(
                "interpreter requirement changed: lock has '{}', manifest has '{}'",
                display_requires(&self.python_version, &self.python_full_version),
                display_requires(&normalized.python_version, &normalized.python_full_version),
            )));
        }

        check_group(&normalized.packages, &self.default, "packages")?;
        check_group(&normalized.dev_packages, &self.develop, "dev-packages")?;
        Ok(())
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockError> {
        let path = path.as_ref();
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| LockError::Io(e.error))?;
        // Fsync parent directory to ensure rename durability on power loss.
        if let Ok(f) = fs::File::open(dir) {
            let _ = f.sync_all();
        }
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn locked_line(prefix: &str, pkg: &LockedPackage) -> String {
    let mut line = format!("{prefix}:{}@{}", pkg.name, pkg.version);
    for hash in &pkg.hashes {
        line.push_str(&format!("#{hash}"));
    }
    line
}

fn display_requires(version: &Option<String>, full: &Option<String>) -> String {
    match (version, full) {
        (Some(v), _) => v.clone(),
        (None, Some(f)) => f.clone(),
        (None, None) => "(none)".to_owned(),
    }
}

fn check_group(
    declared: &[NormalizedDependency],
    locked: &[LockedPackage],
    group: &str,
) -> Result<(), LockError> {
    for dep in declared {
        let Some(pin) = locked.iter().find(|p| p.name == dep.name.as_str()) else {
            return Err(LockError::ManifestDrift(format!(
                "package '{}' is in [{group}] but not in the lock file; re-resolve to update the lock",
                dep.name
            )));
        };
        if !dep.constraint.satisfied_by(&pin.version) {
            return Err(LockError::ManifestDrift(format!(
                "locked version '{}' of '{}' no longer satisfies constraint '{}'",
                pin.version, dep.name, dep.constraint
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_pipfile_str;

    fn sample_normalized() -> NormalizedPipfile {
        parse_pipfile_str(
            r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
boto3 = "*"
jsonschema = ">=3.0"

[dev-packages]
pytest = "*"

[requires]
python_version = "3.7"
"#,
        )
        .unwrap()
        .normalize()
        .unwrap()
    }

    fn sample_resolution() -> ResolutionResult {
        ResolutionResult {
            default: vec![
                LockedPackage {
                    name: "jsonschema".to_owned(),
                    version: "3.2.0".to_owned(),
                    hashes: vec!["sha256:deadbeef".to_owned()],
                },
                LockedPackage {
                    name: "boto3".to_owned(),
                    version: "1.9.253".to_owned(),
                    hashes: Vec::new(),
                },
            ],
            develop: vec![LockedPackage {
                name: "pytest".to_owned(),
                version: "5.4.3".to_owned(),
                hashes: Vec::new(),
            }],
        }
    }

    #[test]
    fn lock_roundtrip() {
        let lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Pipfile.lock");

        lock.write_to_file(&path).unwrap();
        let loaded = LockFile::read_from_file(&path).unwrap();
        assert_eq!(lock, loaded);
    }

    #[test]
    fn lock_packages_are_sorted() {
        let lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());
        assert_eq!(lock.default[0].name, "boto3");
        assert_eq!(lock.default[1].name, "jsonschema");
    }

    #[test]
    fn lock_integrity_check_passes() {
        let lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());
        assert!(lock.verify_integrity().is_ok());
    }

    #[test]
    fn lock_integrity_fails_on_tamper() {
        let mut lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());
        lock.lock_id = "tampered".to_owned();
        assert!(matches!(
            lock.verify_integrity(),
            Err(LockError::LockIdMismatch { .. })
        ));
    }

    #[test]
    fn lock_rejects_unknown_version() {
        let mut lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());
        lock.lock_version = 9;
        assert!(matches!(
            lock.verify_integrity(),
            Err(LockError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn same_resolution_same_identity() {
        let n = sample_normalized();
        let r = sample_resolution();
        let lock1 = LockFile::from_resolved(&n, &r);
        let lock2 = LockFile::from_resolved(&n, &r);
        assert_eq!(lock1.lock_id, lock2.lock_id);
        assert_eq!(lock1.lock_id.len(), 64);
        assert!(lock1.lock_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn resolution_order_does_not_affect_identity() {
        let n = sample_normalized();
        let r1 = sample_resolution();
        let mut r2 = sample_resolution();
        r2.default.reverse();
        assert_eq!(
            LockFile::from_resolved(&n, &r1).lock_id,
            LockFile::from_resolved(&n, &r2).lock_id
        );
    }

    #[test]
    fn different_versions_different_identity() {
        let n = sample_normalized();
        let r1 = sample_resolution();
        let mut r2 = sample_resolution();
        r2.develop[0].version = "6.0.0".to_owned();
        assert_ne!(
            LockFile::from_resolved(&n, &r1).lock_id,
            LockFile::from_resolved(&n, &r2).lock_id
        );
    }

    #[test]
    fn artifact_hashes_change_identity() {
        let n = sample_normalized();
        let r1 = sample_resolution();
        let mut r2 = sample_resolution();
        r2.default[0].hashes.push("sha256:cafef00d".to_owned());
        assert_ne!(
            LockFile::from_resolved(&n, &r1).lock_id,
            LockFile::from_resolved(&n, &r2).lock_id
        );
    }

    #[test]
    fn manifest_intent_verified() {
        let n = sample_normalized();
        let lock = LockFile::from_resolved(&n, &sample_resolution());
        assert!(lock.verify_manifest_intent(&n).is_ok());
    }

    #[test]
    fn drift_detected_for_added_package() {
        let lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());
        let edited = parse_pipfile_str(
            r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
boto3 = "*"
jsonschema = ">=3.0"
jsonpath-ng = "*"

[dev-packages]
pytest = "*"

[requires]
python_version = "3.7"
"#,
        )
        .unwrap()
        .normalize()
        .unwrap();
        assert!(matches!(
            lock.verify_manifest_intent(&edited),
            Err(LockError::ManifestDrift(msg)) if msg.contains("jsonpath-ng")
        ));
    }

    #[test]
    fn drift_detected_for_tightened_constraint() {
        let lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());
        let edited = parse_pipfile_str(
            r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
boto3 = "*"
jsonschema = ">=4.0"

[dev-packages]
pytest = "*"

[requires]
python_version = "3.7"
"#,
        )
        .unwrap()
        .normalize()
        .unwrap();
        // Locked jsonschema 3.2.0 no longer satisfies >=4.0.
        assert!(lock.verify_manifest_intent(&edited).is_err());
    }

    #[test]
    fn drift_detected_for_interpreter_change() {
        let lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());
        let mut edited = sample_normalized();
        edited.python_version = Some("3.11".to_owned());
        assert!(lock.verify_manifest_intent(&edited).is_err());
    }

    #[test]
    fn drift_detected_for_source_change() {
        let lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());
        let mut edited = sample_normalized();
        edited.sources[0].verify_ssl = false;
        assert!(lock.verify_manifest_intent(&edited).is_err());
    }

    #[test]
    fn removed_manifest_package_is_not_drift() {
        // A package present in the lock but dropped from the manifest is
        // stale, not drift: the declared intent is still satisfied.
        let lock = LockFile::from_resolved(&sample_normalized(), &sample_resolution());
        let mut edited = sample_normalized();
        edited.packages.retain(|p| p.name.as_str() != "jsonschema");
        assert!(lock.verify_manifest_intent(&edited).is_ok());
    }
}
