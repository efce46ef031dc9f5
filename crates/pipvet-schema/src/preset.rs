use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub manifest: &'static str,
}

pub const BUILTIN_PRESETS: &[Preset] = &[
    Preset {
        name: "minimal",
        description: "Empty manifest with the public index and no packages",
        manifest: r#"[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]

[dev-packages]

[requires]
python_version = "3.12"
"#,
    },
    Preset {
        name: "library",
        description: "Library project with test and lint tooling",
        manifest: r#"[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]

[dev-packages]
pytest = "*"
pytest-cov = "*"
pylint = "*"
mypy = "*"

[requires]
python_version = "3.12"

[scripts]
test = "pytest tests/"
lint = "pylint src/"
"#,
    },
    Preset {
        name: "cli-app",
        description: "Command-line application with click and packaging tooling",
        manifest: r#"[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
click = "*"
rich = "*"

[dev-packages]
pytest = "*"
pylint = "*"

[requires]
python_version = "3.12"
"#,
    },
    Preset {
        name: "aws",
        description: "AWS service project with SDK, encryption, and schema tooling",
        manifest: r#"[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
python-dateutil = "*"
boto3 = "*"
aws-encryption-sdk = "*"
jsonschema = "*"
jsonpath-ng = "*"

[dev-packages]
pylint = "*"
pytest = "*"
awscli = "*"

[requires]
python_version = "3.12"
"#,
    },
];

pub fn get_preset(name: &str) -> Option<&'static Preset> {
    BUILTIN_PRESETS.iter().find(|p| p.name == name)
}

pub fn list_presets() -> &'static [Preset] {
    BUILTIN_PRESETS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_parse_and_normalize() {
        for preset in BUILTIN_PRESETS {
            let parsed = crate::parse_pipfile_str(preset.manifest);
            assert!(
                parsed.is_ok(),
                "preset '{}' failed to parse: {:?}",
                preset.name,
                parsed.err()
            );
            let normalized = parsed.unwrap().normalize();
            assert!(
                normalized.is_ok(),
                "preset '{}' failed to normalize: {:?}",
                preset.name,
                normalized.err()
            );
        }
    }

    #[test]
    fn get_preset_by_name() {
        assert!(get_preset("minimal").is_some());
        assert!(get_preset("aws").is_some());
        assert!(get_preset("nonexistent").is_none());
    }

    #[test]
    fn all_presets_have_unique_names() {
        let mut names: Vec<&str> = BUILTIN_PRESETS.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN_PRESETS.len());
    }
}
