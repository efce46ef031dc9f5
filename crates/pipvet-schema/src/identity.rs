use crate::normalize::{NormalizedDependency, NormalizedPipfile};
use crate::types::{ManifestId, ShortId};
use serde::Serialize;

/// Deterministic identity for a manifest, derived from its normalized content.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManifestIdentity {
    pub manifest_id: ManifestId,
    pub short_id: ShortId,
}

/// Compute the manifest fingerprint.
///
/// The hash input is the canonical JSON followed by domain-prefixed fields,
/// so equivalent manifests (reordered sections, alternate name spellings,
/// whitespace differences) produce the same id and any semantic change
/// produces a different one.
pub fn compute_manifest_id(normalized: &NormalizedPipfile) -> ManifestIdentity {
    let mut hasher = blake3::Hasher::new();

    hasher.update(normalized.canonical_json().as_bytes());

    for source in &normalized.sources {
        hasher.update(
            format!("src:{}:{}:{}", source.name, source.url, source.verify_ssl).as_bytes(),
        );
    }
    for dep in &normalized.packages {
        hasher.update(dependency_line("pkg", dep).as_bytes());
    }
    for dep in &normalized.dev_packages {
        hasher.update(dependency_line("dev", dep).as_bytes());
    }
    if let Some(py) = &normalized.python_version {
        hasher.update(format!("py:{py}").as_bytes());
    }
    if let Some(py) = &normalized.python_full_version {
        hasher.update(format!("pyfull:{py}").as_bytes());
    }
    for (name, command) in &normalized.scripts {
        hasher.update(format!("script:{name}:{command}").as_bytes());
    }

    let hex = hasher.finalize().to_hex().to_string();
    let short = hex[..12].to_owned();

    ManifestIdentity {
        manifest_id: ManifestId::new(hex),
        short_id: ShortId::new(short),
    }
}

fn dependency_line(prefix: &str, dep: &NormalizedDependency) -> String {
    let mut line = format!("{prefix}:{}@{}", dep.name, dep.constraint);
    if !dep.extras.is_empty() {
        line.push_str(&format!("[{}]", dep.extras.join(",")));
    }
    if let Some(markers) = &dep.markers {
        line.push_str(&format!(";{markers}"));
    }
    if let Some(index) = &dep.index {
        line.push_str(&format!("&{index}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_pipfile_str;

    fn normalized(input: &str) -> NormalizedPipfile {
        parse_pipfile_str(input).unwrap().normalize().unwrap()
    }

    const BASE: &str = r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
boto3 = "*"
jsonschema = "*"

[requires]
python_version = "3.7"
"#;

    #[test]
    fn stable_id_for_equivalent_manifests() {
        let reordered = r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[requires]
python_version = "3.7"

[packages]
jsonschema = "*"
Boto3 = "*"
"#;
        assert_eq!(
            compute_manifest_id(&normalized(BASE)),
            compute_manifest_id(&normalized(reordered))
        );
    }

    #[test]
    fn different_packages_produce_different_ids() {
        let extended = r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
boto3 = "*"
jsonschema = "*"
jsonpath-ng = "*"

[requires]
python_version = "3.7"
"#;
        assert_ne!(
            compute_manifest_id(&normalized(BASE)),
            compute_manifest_id(&normalized(extended))
        );
    }

    #[test]
    fn group_membership_changes_id() {
        // Same package set, but one moved to dev-packages.
        let moved = r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
boto3 = "*"

[dev-packages]
jsonschema = "*"

[requires]
python_version = "3.7"
"#;
        assert_ne!(
            compute_manifest_id(&normalized(BASE)),
            compute_manifest_id(&normalized(moved))
        );
    }

    #[test]
    fn interpreter_change_changes_id() {
        let other = BASE.replace("3.7", "3.11");
        assert_ne!(
            compute_manifest_id(&normalized(BASE)),
            compute_manifest_id(&normalized(&other))
        );
    }

    #[test]
    fn verify_ssl_change_changes_id() {
        let insecure = BASE.replace("verify_ssl = true", "verify_ssl = false");
        assert_ne!(
            compute_manifest_id(&normalized(BASE)),
            compute_manifest_id(&normalized(&insecure))
        );
    }

    #[test]
    fn short_id_is_12_chars() {
        let id = compute_manifest_id(&normalized(BASE));
        assert_eq!(id.short_id.as_str().len(), 12);
        assert!(id.manifest_id.as_str().starts_with(id.short_id.as_str()));
        assert_eq!(id.manifest_id.as_str().len(), 64);
    }

    #[test]
    fn id_stable_across_repeated_invocations() {
        let n = normalized(BASE);
        let first = compute_manifest_id(&n);
        for _ in 0..50 {
            assert_eq!(compute_manifest_id(&n), first);
        }
    }
}
