use super::{json_pretty, load_normalized, status_ok, EXIT_SUCCESS};
use pipvet_schema::LockFile;
use std::path::Path;

pub fn run(manifest_path: &Path, lock_path: &Path, json: bool) -> Result<u8, String> {
    let normalized = load_normalized(manifest_path)?;

    // Every lock-side failure carries the same prefix; main keys the lock
    // exit code off it.
    let lock_err = |e: pipvet_schema::LockError| format!("lock error: {e}");
    let lock = LockFile::read_from_file(lock_path).map_err(lock_err)?;
    lock.verify_integrity().map_err(lock_err)?;
    lock.verify_manifest_intent(&normalized).map_err(lock_err)?;

    if json {
        let payload = serde_json::json!({
            "status": "ok",
            "manifest": manifest_path,
            "lock": lock_path,
            "lock_id": lock.lock_id,
            "short_id": lock.short_id,
            "default": lock.default.len(),
            "develop": lock.develop.len(),
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("{}", status_ok("lock file internally consistent"));
    println!(
        "{}",
        status_ok("manifest intent satisfied by locked versions")
    );
    println!(
        "lock_id: {} ({} default, {} develop)",
        lock.short_id,
        lock.default.len(),
        lock.develop.len()
    );
    Ok(EXIT_SUCCESS)
}
