use super::{json_pretty, load_normalized, EXIT_SUCCESS};
use pipvet_schema::compute_manifest_id;
use std::path::Path;

pub fn run(manifest_path: &Path, json: bool) -> Result<u8, String> {
    let normalized = load_normalized(manifest_path)?;
    let identity = compute_manifest_id(&normalized);

    if json {
        let payload = serde_json::json!({
            "manifest": manifest_path,
            "manifest_id": identity.manifest_id,
            "short_id": identity.short_id,
            "normalized": normalized,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("manifest_id:  {}", identity.manifest_id);
    println!("short_id:     {}", identity.short_id);
    for source in &normalized.sources {
        println!(
            "source:       {} {} (verify_ssl: {})",
            source.name, source.url, source.verify_ssl
        );
    }
    match &normalized.python_version {
        Some(py) => println!("python:       {py}"),
        None => println!("python:       (unconstrained)"),
    }

    println!("packages:     {}", normalized.packages.len());
    for dep in &normalized.packages {
        println!("  {} {}", dep.name, dep.constraint);
    }
    println!("dev-packages: {}", normalized.dev_packages.len());
    for dep in &normalized.dev_packages {
        println!("  {} {}", dep.name, dep.constraint);
    }
    if !normalized.scripts.is_empty() {
        println!("scripts:      {}", normalized.scripts.len());
        for (name, command) in &normalized.scripts {
            println!("  {name} = {command}");
        }
    }
    Ok(EXIT_SUCCESS)
}
