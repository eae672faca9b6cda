//! Build core configuration (`weft.toml`).
//!
//! Typed configuration for the knobs the core exposes to its host:
//! resolution stub marking, consistency checking, and the parallel worker
//! ceiling. Missing fields use defaults; a missing file is all defaults
//! (no error).

use std::fmt;
use std::path::Path;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level weft configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeftConfig {
    /// Global resolution settings.
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Consistency checker settings.
    #[serde(default)]
    pub consistency: ConsistencyConfig,

    /// Parallel build settings.
    #[serde(default)]
    pub build: BuildConfig,
}

impl WeftConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError {
            path: Some(path.to_path_buf()),
            message: format!("failed to read: {e}"),
        })?;
        Self::from_toml_str(&text).map_err(|mut e| {
            e.path = Some(path.to_path_buf());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or contains unknown fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError {
            path: None,
            message: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// ResolutionConfig
// ---------------------------------------------------------------------------

/// Global resolution settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolutionConfig {
    /// Marker word used in the stub substituted for a deferred node that
    /// could not be resolved (default: `"unresolved"`).
    #[serde(default = "default_stub_marker")]
    pub stub_marker: String,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            stub_marker: default_stub_marker(),
        }
    }
}

fn default_stub_marker() -> String {
    "unresolved".to_owned()
}

// ---------------------------------------------------------------------------
// ConsistencyConfig
// ---------------------------------------------------------------------------

/// Consistency checker settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsistencyConfig {
    /// Whether matched slugs are also compared record-to-record for
    /// mismatch issues (default: `true`).
    #[serde(default = "default_true")]
    pub check_mismatches: bool,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            check_mismatches: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// BuildConfig
// ---------------------------------------------------------------------------

/// Parallel build settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Maximum number of parallel parse workers the host should spawn.
    /// `0` means "host decides" (default).
    #[serde(default)]
    pub max_workers: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { max_workers: 0 }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A configuration load or parse error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    /// Path to the configuration file, when known.
    pub path: Option<std::path::PathBuf>,
    /// Human-readable description of the problem.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "config error in '{}': {}", path.display(), self.message),
            None => write!(f, "config error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
