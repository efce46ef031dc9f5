pub mod check;
pub mod completions;
pub mod fmt;
pub mod inspect;
pub mod new;
pub mod verify;

use pipvet_schema::{ManifestError, NormalizedPipfile};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_LOCK_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Parse and normalize a manifest, mapping errors to the CLI message prefix
/// that selects the manifest exit code.
pub fn load_normalized(path: &Path) -> Result<NormalizedPipfile, String> {
    tracing::debug!(path = %path.display(), "parsing manifest");
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read manifest file: {e}"))?;
    parse_normalized(&content)
}

/// Normalize already-read manifest text. Commands that compare against the
/// file content use this so they judge exactly the text they parsed.
pub fn parse_normalized(content: &str) -> Result<NormalizedPipfile, String> {
    let pipfile = pipvet_schema::parse_pipfile_str(content).map_err(describe_manifest_error)?;
    pipfile.normalize().map_err(describe_manifest_error)
}

fn describe_manifest_error(err: ManifestError) -> String {
    match err {
        ManifestError::Io(e) => format!("failed to read manifest file: {e}"),
        ManifestError::ParseToml(e) => format!("failed to parse manifest: {e}"),
        other => format!("manifest error: {other}"),
    }
}

pub fn write_atomic(dest: &Path, content: &str) -> Result<(), String> {
    let dir = dest
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| format!("write temp file: {e}"))?;
    use std::io::Write;
    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("write temp file: {e}"))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| format!("fsync temp file: {e}"))?;
    tmp.persist(dest)
        .map_err(|e| format!("persist manifest: {}", e.error))?;
    Ok(())
}

pub fn status_ok(msg: &str) -> String {
    use console::Style;
    format!("{} {msg}", Style::new().green().apply_to("✓"))
}

pub fn status_fail(msg: &str) -> String {
    use console::Style;
    format!("{} {msg}", Style::new().red().apply_to("✗"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_string() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Pipfile");
        write_atomic(&dest, "first").unwrap();
        write_atomic(&dest, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "second");
    }

    #[test]
    fn load_normalized_maps_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Pipfile");
        std::fs::write(&dest, "not [ valid toml").unwrap();
        let err = load_normalized(&dest).unwrap_err();
        assert!(err.starts_with("failed to parse manifest"), "{err}");
    }

    #[test]
    fn load_normalized_maps_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_normalized(&dir.path().join("Pipfile")).unwrap_err();
        assert!(err.starts_with("failed to read manifest file"), "{err}");
    }

    #[test]
    fn parse_normalized_reports_manifest_errors() {
        let err = parse_normalized(
            "[[source]]\nurl = \"ftp://pypi.org/simple\"\nverify_ssl = true\nname = \"pypi\"\n",
        )
        .unwrap_err();
        assert!(err.starts_with("manifest error:"), "{err}");
    }

    #[test]
    fn parse_normalized_accepts_valid_text() {
        let n = parse_normalized(
            "[[source]]\nurl = \"https://pypi.org/simple\"\nverify_ssl = true\nname = \"pypi\"\n",
        )
        .unwrap();
        assert_eq!(n.sources.len(), 1);
    }

    #[test]
    fn status_lines_contain_message() {
        assert!(status_ok("sources valid").contains("sources valid"));
        assert!(status_fail("duplicate package").contains("duplicate package"));
    }
}
