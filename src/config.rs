//! Watcher configuration: stability tuning and ignore rules.
//!
//! Configuration is optional; the built-in defaults poll every 1000 ms,
//! require 3 stable checks, give up after 10 attempts, and skip hidden
//! files plus in-progress download artifacts. When a file is present it
//! is TOML:
//!
//! ```toml
//! [stability]
//! poll_interval_ms = 1000
//! required_stable_checks = 3
//! max_attempts = 10
//!
//! [ignore]
//! skip_hidden = true
//! filenames = ["Thumbs.db"]
//! extensions = ["crdownload", "part", "download", "tmp"]
//! patterns = ["*.partial"]
//! regex = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::stability::StabilityPolicy;

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the explicitly specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level watcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Stability-check tuning.
    #[serde(default)]
    pub stability: StabilitySettings,

    /// Rules for paths the watcher leaves alone.
    #[serde(default)]
    pub ignore: IgnoreRules,
}

impl WatchConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. `.tidywatch.toml` in the current directory
    /// 3. `~/.config/tidywatch/config.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file cannot be read, or
    /// if any discovered file fails to parse.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".tidywatch.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("tidywatch")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            stability: StabilitySettings::default(),
            ignore: IgnoreRules::default(),
        }
    }
}

/// Stability-check tuning, in configuration-friendly units.
#[derive(Debug, Clone, Deserialize)]
pub struct StabilitySettings {
    /// Milliseconds between file-size polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Consecutive unchanged size readings required before a move.
    #[serde(default = "default_required_stable_checks")]
    pub required_stable_checks: u32,

    /// Size readings to take before giving up on an unsettled file.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_required_stable_checks() -> u32 {
    3
}

fn default_max_attempts() -> u32 {
    10
}

impl Default for StabilitySettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            required_stable_checks: default_required_stable_checks(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl StabilitySettings {
    /// Converts the configured values into the detector's policy.
    pub fn to_policy(&self) -> StabilityPolicy {
        StabilityPolicy {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            required_stable_checks: self.required_stable_checks,
            max_attempts: self.max_attempts,
        }
    }
}

/// Rules for paths the watcher should not process.
///
/// The defaults keep hidden files and in-progress browser downloads out of
/// the pipeline; a half-downloaded `*.crdownload` would otherwise tie up a
/// stability wait just to be moved under its temporary name.
#[derive(Debug, Clone, Deserialize)]
pub struct IgnoreRules {
    /// Whether files with a leading dot are skipped. Defaults to true.
    #[serde(default = "default_skip_hidden")]
    pub skip_hidden: bool,

    /// Exact filenames to skip (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// File extensions to skip, matched case-insensitively.
    #[serde(default = "default_ignore_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns to skip (e.g., "*.partial").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns to skip, matched against the filename.
    #[serde(default)]
    pub regex: Vec<String>,
}

fn default_skip_hidden() -> bool {
    true
}

fn default_ignore_extensions() -> Vec<String> {
    ["crdownload", "part", "download", "tmp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            skip_hidden: default_skip_hidden(),
            filenames: Vec::new(),
            extensions: default_ignore_extensions(),
            patterns: Vec::new(),
            regex: Vec::new(),
        }
    }
}

impl IgnoreRules {
    /// Compile the rules into optimized matching structures.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn compile(self) -> Result<CompiledIgnoreRules, ConfigError> {
        CompiledIgnoreRules::new(self)
    }
}

/// Pre-compiled ignore rules for per-file matching.
pub struct CompiledIgnoreRules {
    skip_hidden: bool,
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl CompiledIgnoreRules {
    fn new(rules: IgnoreRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            filenames: rules.filenames.into_iter().collect(),
            extensions: rules
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }

    /// Check whether a file should enter the pipeline.
    ///
    /// Checks run in this order, with early termination:
    /// 1. Hidden-file filter
    /// 2. Exact filename match
    /// 3. Extension match
    /// 4. Glob pattern match
    /// 5. Regex pattern match
    /// 6. Default: process
    pub fn should_process(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .patterns
            .iter()
            .any(|pattern| pattern.matches(file_name.as_ref()))
        {
            return false;
        }

        if self.regexes.iter().any(|regex| regex.is_match(&file_name)) {
            return false;
        }

        true
    }
}
