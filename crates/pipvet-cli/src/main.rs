mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_LOCK_ERROR, EXIT_MANIFEST_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pipvet",
    version,
    about = "Validation, canonical formatting, and lock verification for Pipfile manifests"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a starter Pipfile in the current directory.
    New {
        /// Preset to start from (minimal, library, cli-app, aws).
        #[arg(long)]
        template: Option<String>,
        /// Overwrite an existing Pipfile without asking.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Parse a manifest and run every structural check.
    Check {
        /// Path to the manifest.
        #[arg(default_value = "Pipfile")]
        manifest: PathBuf,
    },
    /// Rewrite a manifest in canonical form (sorted, normalized names).
    Fmt {
        /// Path to the manifest.
        #[arg(default_value = "Pipfile")]
        manifest: PathBuf,
        /// Exit non-zero if the manifest is not already canonical.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Show the normalized form and identity of a manifest.
    Inspect {
        /// Path to the manifest.
        #[arg(default_value = "Pipfile")]
        manifest: PathBuf,
    },
    /// Verify a lock file against its manifest.
    Verify {
        /// Path to the manifest.
        #[arg(default_value = "Pipfile")]
        manifest: PathBuf,
        /// Path to the lock file.
        #[arg(long, default_value = "Pipfile.lock")]
        lock: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PIPVET_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::New { template, force } => {
            commands::new::run(template.as_deref(), force, json_output)
        }
        Commands::Check { manifest } => commands::check::run(&manifest, json_output),
        Commands::Fmt { manifest, check } => commands::fmt::run(&manifest, check, json_output),
        Commands::Inspect { manifest } => commands::inspect::run(&manifest, json_output),
        Commands::Verify { manifest, lock } => commands::verify::run(&manifest, &lock, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:")
                || msg.starts_with("failed to parse manifest")
                || msg.starts_with("failed to read manifest")
            {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("lock error:") {
                EXIT_LOCK_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
