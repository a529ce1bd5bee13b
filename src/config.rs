//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$CASESORT_CONFIG` (environment variable)
//! 2. `~/.config/casesort/config.toml` (Linux/macOS)
//!    `%APPDATA%\casesort\config.toml` (Windows)
//! 3. Built-in defaults

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::classify::Category;
use crate::extract::{WalkSettings, DEFAULT_MAX_DEPTH};
use crate::model::attachment::DecorativeRule;
use crate::naming::rename::NamingLimits;
use crate::workflow::OrganizerOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub organize: OrganizeConfig,
    pub classification: ClassificationConfig,
    pub attachments: AttachmentsConfig,
    pub naming: NamingLimits,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for fallback ledgers and logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Defaults for `casesort organize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    /// Create the category folders here instead of inside the root.
    pub output_dir: Option<PathBuf>,
    /// Folder names never scanned.
    pub exclude_folders: Vec<String>,
    /// Deepest nested email still walked (top level is 0).
    pub max_depth: usize,
}

/// Extension overrides, e.g. `overrides = { txt = "TechnicalDocument" }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub overrides: HashMap<String, Category>,
}

/// Decorative-image filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentsConfig {
    /// Case-insensitive name markers.
    pub decorative_markers: Vec<String>,
    /// Attachments at or above this size (bytes) are always kept.
    pub decorative_max_size: u64,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            exclude_folders: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        let rule = DecorativeRule::default();
        Self {
            decorative_markers: rule.markers,
            decorative_max_size: rule.max_size,
        }
    }
}

impl Config {
    /// Walker settings derived from the `[organize]`, `[attachments]` and
    /// `[naming]` sections.
    pub fn walk_settings(&self) -> WalkSettings {
        WalkSettings {
            max_depth: self.organize.max_depth,
            decorative: DecorativeRule {
                markers: self.attachments.decorative_markers.clone(),
                max_size: self.attachments.decorative_max_size,
            },
            naming: self.naming.clone(),
        }
    }

    /// Organizer options before command-line overrides.
    pub fn organizer_options(&self) -> OrganizerOptions {
        OrganizerOptions {
            output_dir: self.organize.output_dir.clone(),
            exclude_folders: self.organize.exclude_folders.clone(),
            category_overrides: self.classification.overrides.clone(),
            walk: self.walk_settings(),
            cache_dir: Some(cache_dir(self)),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("CASESORT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("casesort").join("config.toml"))
}

/// Return the cache directory for fallback ledgers and logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    crate::ledger::format::default_cache_dir()
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("casesort.log")
}
