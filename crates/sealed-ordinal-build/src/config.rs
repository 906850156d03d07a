//! TOML configuration parser for `ordinal.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What to do when a configured root fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnError {
    /// Fail the build (default, safest)
    #[default]
    Error,
    /// Emit cargo warnings, keep every artifact that was committed
    Warn,
}

/// Parsed generator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdinalConfig {
    /// Directory scanned for `#[ordinal]` enums, usually `src`
    pub source_root: PathBuf,
    /// Path of the `sealed-ordinal` crate as seen from generated code
    pub crate_path: String,
    /// Behavior when a root is rejected or overlaps another
    pub on_error: OnError,
    /// Paths under `source_root` that are not scanned
    pub exclude: Vec<PathBuf>,
}

impl Default for OrdinalConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("src"),
            crate_path: "::sealed_ordinal".to_string(),
            on_error: OnError::Error,
            exclude: Vec::new(),
        }
    }
}

/// Raw TOML structure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOrdinalConfig {
    source_root: Option<String>,
    crate_path: Option<String>,
    /// "error" (default) or "warn"
    on_error: Option<String>,
    exclude: Option<Vec<String>>,
}

impl OrdinalConfig {
    /// Parse from a TOML file. A relative `source_root` is resolved against
    /// the directory holding the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_str(&content)?;
        if config.source_root.is_relative()
            && let Some(dir) = path.parent()
        {
            config.source_root = dir.join(&config.source_root);
        }
        Ok(config)
    }

    /// Parse from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawOrdinalConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let on_error = match raw.on_error.as_deref() {
            None | Some("error") => OnError::Error,
            Some("warn") => OnError::Warn,
            Some(other) => {
                return Err(ConfigError::Validation(format!(
                    "Invalid on_error value '{}': expected 'error' or 'warn'",
                    other
                )));
            }
        };

        let crate_path = raw.crate_path.unwrap_or(defaults.crate_path);
        if syn::parse_str::<syn::Path>(&crate_path).is_err() {
            return Err(ConfigError::Validation(format!(
                "Invalid crate_path '{}': expected a Rust path such as '::sealed_ordinal'",
                crate_path
            )));
        }

        let mut exclude = Vec::new();
        for entry in raw.exclude.unwrap_or_default() {
            let entry = PathBuf::from(entry);
            if entry.is_absolute() {
                return Err(ConfigError::Validation(format!(
                    "Invalid exclude '{}': must be relative to source_root",
                    entry.display()
                )));
            }
            exclude.push(entry);
        }

        let source_root = match raw.source_root {
            Some(root) if root.trim().is_empty() => {
                return Err(ConfigError::Validation("Empty source_root not allowed".into()));
            }
            Some(root) => PathBuf::from(root),
            None => defaults.source_root,
        };

        Ok(Self {
            source_root,
            crate_path,
            on_error,
            exclude,
        })
    }

    /// Whether a path relative to `source_root` is excluded.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.iter().any(|prefix| relative.starts_with(prefix))
    }
}

/// Errors during config parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
