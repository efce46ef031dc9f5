use super::{json_pretty, write_atomic, EXIT_SUCCESS};
use dialoguer::{Confirm, Input};
use pipvet_schema::manifest::{
    Dependency, DependencyGroup, Pipfile, RequiresSection, ScriptsSection, SourceEntry,
};
use pipvet_schema::{get_preset, list_presets, parse_pipfile_str};
use std::io::{stderr, stdin, IsTerminal};
use std::path::Path;

const DEST_MANIFEST: &str = "Pipfile";
const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple";

fn load_template(name: &str) -> Result<&'static str, String> {
    let preset = get_preset(name).ok_or_else(|| {
        let known: Vec<&str> = list_presets().iter().map(|p| p.name).collect();
        format!("unknown template '{name}' (expected: {})", known.join(", "))
    })?;
    Ok(preset.manifest)
}

fn ensure_can_write(dest: &Path, force: bool, is_tty: bool) -> Result<(), String> {
    if !dest.exists() || force {
        return Ok(());
    }
    if !is_tty {
        return Err(format!(
            "refusing to overwrite existing ./{DEST_MANIFEST} (pass --force)"
        ));
    }
    let overwrite = Confirm::new()
        .with_prompt(format!("overwrite ./{DEST_MANIFEST}?"))
        .default(false)
        .interact()
        .map_err(|e| format!("prompt failed: {e}"))?;
    if overwrite {
        Ok(())
    } else {
        Err(format!(
            "refusing to overwrite existing ./{DEST_MANIFEST} (pass --force)"
        ))
    }
}

fn prompt_group(prompt: &str) -> Result<DependencyGroup, String> {
    let raw: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| format!("prompt failed: {e}"))?;
    let mut group = DependencyGroup::default();
    for name in raw.split_whitespace() {
        group
            .entries
            .insert(name.to_owned(), Dependency::Spec("*".to_owned()));
    }
    Ok(group)
}

fn prompt_manifest() -> Result<Pipfile, String> {
    let python_version: String = Input::new()
        .with_prompt("python version")
        .default("3.12".to_owned())
        .interact_text()
        .map_err(|e| format!("prompt failed: {e}"))?;
    let packages = prompt_group("packages (space-separated, empty to skip)")?;
    let dev_packages = prompt_group("dev-packages (space-separated, empty to skip)")?;

    Ok(Pipfile {
        source: vec![SourceEntry {
            url: DEFAULT_INDEX_URL.to_owned(),
            verify_ssl: true,
            name: "pypi".to_owned(),
        }],
        packages,
        dev_packages,
        requires: RequiresSection {
            python_version: Some(python_version),
            python_full_version: None,
        },
        scripts: ScriptsSection::default(),
    })
}

fn print_result(template: Option<&str>, json: bool) -> Result<(), String> {
    if json {
        let payload = serde_json::json!({
            "status": "written",
            "path": format!("./{DEST_MANIFEST}"),
            "template": template,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("wrote ./{DEST_MANIFEST}");
        if let Some(tpl) = template {
            println!("template: {tpl}");
        }
    }
    Ok(())
}

pub fn run(template: Option<&str>, force: bool, json: bool) -> Result<u8, String> {
    let dest = Path::new(DEST_MANIFEST);
    let is_tty = stdin().is_terminal() && stderr().is_terminal();

    let content = if let Some(tpl) = template {
        let text = load_template(tpl)?;
        ensure_can_write(dest, force, is_tty)?;
        text.to_owned()
    } else {
        ensure_can_write(dest, force, is_tty)?;
        if !is_tty {
            return Err("no --template provided and stdin is not a TTY".to_owned());
        }
        let manifest = prompt_manifest()?;
        // Normalize before writing so the starter file is already canonical.
        let normalized = manifest
            .normalize()
            .map_err(|e| format!("manifest error: {e}"))?;
        normalized
            .canonical_toml()
            .map_err(|e| format!("TOML serialization failed: {e}"))?
    };

    // Guard against shipping a template that no longer parses.
    parse_pipfile_str(&content).map_err(|e| format!("template parse error: {e}"))?;

    write_atomic(dest, &content)?;
    print_result(template, json)?;
    Ok(EXIT_SUCCESS)
}
