use super::{json_pretty, load_normalized, status_ok, EXIT_SUCCESS};
use pipvet_schema::compute_manifest_id;
use std::path::Path;

pub fn run(manifest_path: &Path, json: bool) -> Result<u8, String> {
    let normalized = load_normalized(manifest_path)?;
    let identity = compute_manifest_id(&normalized);

    if json {
        let payload = serde_json::json!({
            "status": "ok",
            "manifest": manifest_path,
            "sources": normalized.sources.len(),
            "packages": normalized.packages.len(),
            "dev_packages": normalized.dev_packages.len(),
            "python_version": normalized.python_version,
            "manifest_id": identity.manifest_id,
            "short_id": identity.short_id,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!(
        "{}",
        status_ok(&format!(
            "parsed {} source(s), {} package(s), {} dev-package(s)",
            normalized.sources.len(),
            normalized.packages.len(),
            normalized.dev_packages.len()
        ))
    );
    println!("{}", status_ok("registry sources well-formed"));
    println!(
        "{}",
        status_ok("package names unique within each group")
    );
    println!("{}", status_ok("no conflicting cross-group constraints"));
    match &normalized.python_version {
        Some(py) => println!("{}", status_ok(&format!("interpreter requirement {py}"))),
        None => println!("{}", status_ok("no interpreter requirement declared")),
    }
    println!("manifest_id: {}", identity.short_id);
    Ok(EXIT_SUCCESS)
}
