//! Build-time driver for sealed-ordinal.
//!
//! This crate provides tools for:
//! - Parsing the `ordinal.toml` configuration file
//! - Scanning crate sources for `#[ordinal]` enums
//! - Generating one `<Name>Ext` artifact per numbered enum, an index to
//!   `include!` and a manifest of every assigned ordinal
//!
//! # Usage in build.rs
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     let out_dir = std::env::var("OUT_DIR").unwrap();
//!     sealed_ordinal_build::generate("ordinal.toml", out_dir)
//!         .expect("Failed to generate ordinals");
//! }
//! ```
//!
//! ```ignore
//! // src/lib.rs
//! include!(concat!(env!("OUT_DIR"), "/ordinals.rs"));
//! ```
//!
//! Generated impls name their enum by its path from the crate root, so a
//! numbered enum must be visible from there (`pub` or `pub(crate)` inside
//! submodules).
//!
//! # Error Modes
//!
//! Configure `on_error` in `ordinal.toml`:
//!
//! ```toml
//! # Default: a rejected or overlapping root fails the build
//! on_error = "error"
//!
//! # Or: report it as a cargo warning and keep what was committed
//! on_error = "warn"
//! ```

mod codegen;
mod config;
mod scan;
mod writer;

pub use codegen::{const_name, render_group};
pub use config::{ConfigError, OnError, OrdinalConfig};
pub use scan::{module_path_of, scan, EnumShape, ScanError, ScannedSource, Scanner};
pub use writer::{ArtifactFile, FileWriter, ManifestError, ARTIFACT_DIR, INDEX_FILE, MANIFEST_FILE};

use std::path::{Path, PathBuf};

use sealed_ordinal::{OrdinalError, Processor, Report};
use thiserror::Error;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct Generated {
    /// `ordinals.rs`, the file to `include!`
    pub index: PathBuf,
    pub manifest: PathBuf,
    /// Every artifact file written, in commit order
    pub artifacts: Vec<PathBuf>,
    /// Diagnostics downgraded by `on_error = "warn"`
    pub warnings: Vec<String>,
    /// Source files that were scanned
    pub sources: Vec<PathBuf>,
}

/// Main entry point for build.rs integration.
///
/// Reads `ordinal.toml`, scans the configured source root and writes the
/// generated files into `out_dir`.
///
/// # Arguments
///
/// * `config_path` - Path to `ordinal.toml`
/// * `out_dir` - Output directory, normally `OUT_DIR`
///
/// # Errors
///
/// Returns an error if:
/// - `ordinal.toml` cannot be read or parsed
/// - a source file cannot be read or parsed
/// - a root is rejected or overlaps another and `on_error = "error"`
/// - an output file cannot be written
pub fn generate(
    config_path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
) -> Result<Generated, GenerateError> {
    let config_path = config_path.as_ref();
    println!("cargo:rerun-if-changed={}", config_path.display());

    let config = OrdinalConfig::from_file(config_path)?;
    generate_with_config(&config, out_dir)
}

/// Generate from configuration text. A relative `source_root` is resolved
/// against `base_dir`.
pub fn generate_from_str(
    content: &str,
    base_dir: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
) -> Result<Generated, GenerateError> {
    let mut config = OrdinalConfig::from_str(content)?;
    if config.source_root.is_relative() {
        config.source_root = base_dir.as_ref().join(&config.source_root);
    }
    generate_with_config(&config, out_dir)
}

/// Generate with an already parsed configuration.
pub fn generate_with_config(
    config: &OrdinalConfig,
    out_dir: impl AsRef<Path>,
) -> Result<Generated, GenerateError> {
    let out_dir = out_dir.as_ref();

    // 1. Scan sources
    println!("cargo:rerun-if-changed={}", config.source_root.display());
    let scanned = scan(config)?;
    for file in &scanned.files {
        println!("cargo:rerun-if-changed={}", file.display());
    }
    tracing::info!(
        files = scanned.files.len(),
        roots = scanned.table.configured_roots().len(),
        "scanned sources"
    );

    // 2. Number and write every root
    std::fs::create_dir_all(out_dir)?;
    let writer = FileWriter::new(
        out_dir.join(ARTIFACT_DIR),
        &scanned.shapes,
        config.crate_path.as_str(),
    )?;
    let mut processor = Processor::new(writer);
    let report = processor.run(&scanned.table);
    let writer = processor.into_writer();

    // 3. Index and manifest cover whatever was committed
    let index = writer.write_index(&scanned.table, out_dir)?;
    let manifest = writer.write_manifest(&scanned.table, out_dir)?;

    // 4. Handle failed roots based on on_error strategy
    let warnings = handle_errors(config.on_error, report)?;

    Ok(Generated {
        index,
        manifest,
        artifacts: writer.written().iter().map(|a| a.path.clone()).collect(),
        warnings,
        sources: scanned.files,
    })
}

fn handle_errors(on_error: OnError, report: Report) -> Result<Vec<String>, GenerateError> {
    if report.is_success() {
        return Ok(Vec::new());
    }
    match on_error {
        OnError::Error => Err(GenerateError::Ordinal(report.errors)),
        OnError::Warn => {
            let warnings: Vec<String> = report
                .errors
                .iter()
                .map(|err| format!("{}: {err}", err.location()))
                .collect();
            for warning in &warnings {
                println!("cargo:warning=sealed-ordinal: {warning}");
            }
            Ok(warnings)
        }
    }
}

fn format_errors(errors: &[OrdinalError]) -> String {
    let mut msg = format!("sealed-ordinal: {} root(s) failed\n", errors.len());
    for err in errors {
        msg.push_str(&format!("  {}: {err}\n", err.location()));
    }
    msg.push_str("\n  To fix:\n");
    msg.push_str("    1. Move #[ordinal] to a single enum per hierarchy, OR\n");
    msg.push_str("    2. Use #[ordinal(recursive = false)] on the outer enum, OR\n");
    msg.push_str("    3. Set `on_error = \"warn\"` in ordinal.toml to only warn\n");
    msg
}

/// Errors that can occur during generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Failed to parse ordinal.toml
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Failed to read or parse a source file
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Rejected or overlapping roots
    #[error("{}", format_errors(.0))]
    Ordinal(Vec<OrdinalError>),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
