use super::{json_pretty, parse_normalized, write_atomic, EXIT_SUCCESS};
use std::fs;
use std::path::Path;

pub fn run(manifest_path: &Path, check: bool, json: bool) -> Result<u8, String> {
    // Single read: the canonical comparison must judge the same text that
    // was parsed, even if the file is edited concurrently.
    let current = fs::read_to_string(manifest_path)
        .map_err(|e| format!("failed to read manifest file: {e}"))?;
    let normalized = parse_normalized(&current)?;
    let canonical = normalized
        .canonical_toml()
        .map_err(|e| format!("TOML serialization failed: {e}"))?;
    let already_canonical = current == canonical;

    if check {
        if already_canonical {
            if json {
                let payload = serde_json::json!({
                    "status": "canonical",
                    "manifest": manifest_path,
                });
                println!("{}", json_pretty(&payload)?);
            }
            return Ok(EXIT_SUCCESS);
        }
        return Err(format!(
            "manifest {} is not in canonical form (run 'pipvet fmt')",
            manifest_path.display()
        ));
    }

    if !already_canonical {
        write_atomic(manifest_path, &canonical)?;
    }

    if json {
        let payload = serde_json::json!({
            "status": if already_canonical { "unchanged" } else { "formatted" },
            "manifest": manifest_path,
        });
        println!("{}", json_pretty(&payload)?);
    } else if already_canonical {
        println!("{} already canonical", manifest_path.display());
    } else {
        println!("formatted {}", manifest_path.display());
    }

    Ok(EXIT_SUCCESS)
}
