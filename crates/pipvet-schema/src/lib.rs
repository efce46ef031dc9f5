//! Pipfile parsing, normalization, identity, and lock verification for pipvet.
//!
//! This crate defines the schema layer: TOML manifest parsing (`Pipfile`),
//! the requirement grammar (name normalization and version specifiers),
//! normalized representations (`NormalizedPipfile`), deterministic manifest
//! identity computation (`compute_manifest_id`), lock file
//! generation/verification (`LockFile`), and built-in preset definitions.

pub mod identity;
pub mod lock;
pub mod manifest;
pub mod normalize;
pub mod preset;
pub mod requirement;
pub mod types;

pub use identity::{compute_manifest_id, ManifestIdentity};
pub use lock::{LockError, LockFile, LockedPackage, ResolutionResult};
pub use manifest::{
    parse_pipfile_file, parse_pipfile_str, Dependency, DependencyGroup, DetailedDependency,
    ManifestError, Pipfile, RequiresSection, ScriptsSection, SourceEntry,
};
pub use normalize::{NormalizedDependency, NormalizedPipfile, NormalizedSource};
pub use preset::{get_preset, list_presets, Preset, BUILTIN_PRESETS};
pub use requirement::{
    normalize_name, parse_constraint, RequirementError, Specifier, VersionConstraint, VersionOp,
};
pub use types::{LockId, ManifestId, PackageName, ShortId, SourceName};
