//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content root; its values are merged over the stock defaults, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Portfolio"
//! description = ""
//! author = ""
//! base_url = "/"
//!
//! [source]
//! format = "markdown"        # "markdown" or "json"
//! posts_dir = "posts"        # markdown posts, relative to the content root
//! export_file = "export.json" # CMS export, relative to the content root
//!
//! [build]
//! max_processes = 4          # Max parallel workers (omit for auto = CPU cores)
//!
//! [deploy]
//! owner = "owner"
//! repo = "site"
//! status_context = "Ghost Inspector E2E Tests"
//! test_api = "https://api.ghostinspector.com/v1"
//! status_api = "https://api.github.com"
//! timeout_secs = 600
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity shown in every page layout.
    pub site: SiteMeta,
    /// Where content comes from.
    pub source: SourceConfig,
    /// Parallelism settings.
    pub build: BuildConfig,
    /// Deploy-preview verification target.
    pub deploy: DeployTarget,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("site.title", &self.site.title),
            ("source.posts_dir", &self.source.posts_dir),
            ("source.export_file", &self.source.export_file),
            ("deploy.owner", &self.deploy.owner),
            ("deploy.repo", &self.deploy.repo),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        for (key, url) in [
            ("deploy.test_api", &self.deploy.test_api),
            ("deploy.status_api", &self.deploy.status_api),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be an http(s) URL"
                )));
            }
        }
        if self.deploy.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "deploy.timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    pub title: String,
    pub description: String,
    pub author: String,
    /// Prefix for every generated link.
    pub base_url: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            description: String::new(),
            author: String::new(),
            base_url: "/".to_string(),
        }
    }
}

impl SiteMeta {
    /// Join a route onto `base_url` without doubling the slash.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Content source format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Markdown files with TOML front matter.
    #[default]
    Markdown,
    /// Headless CMS JSON export.
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub format: SourceFormat,
    /// Directory of markdown posts, relative to the content root.
    pub posts_dir: String,
    /// CMS export file, relative to the content root.
    pub export_file: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            format: SourceFormat::Markdown,
            posts_dir: "posts".to_string(),
            export_file: "export.json".to_string(),
        }
    }
}

/// Parallel build settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &BuildConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Where deploy verification reports commit statuses and which test API it uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployTarget {
    /// Repository owner on the source-control host.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Label of the commit status.
    pub status_context: String,
    /// Base URL of the end-to-end test API.
    pub test_api: String,
    /// Base URL of the source-control API.
    pub status_api: String,
    /// HTTP timeout; a suite run blocks until every test finishes.
    pub timeout_secs: u64,
}

impl Default for DeployTarget {
    fn default() -> Self {
        Self {
            owner: "owner".to_string(),
            repo: "site".to_string(),
            status_context: "Ghost Inspector E2E Tests".to_string(),
            test_api: "https://api.ghostinspector.com/v1".to_string(),
            status_api: "https://api.github.com".to_string(),
            timeout_secs: 600,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the content root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
title = "Portfolio"
description = ""
# Shown in the page footer.
author = ""
# Prefix for every generated link.
base_url = "/"

# ---------------------------------------------------------------------------
# Content source
# ---------------------------------------------------------------------------
[source]
# "markdown": posts are .md files with +++ TOML front matter.
# "json": posts come from a headless CMS export ({ "items": [...] }).
format = "markdown"
# Directory of markdown posts, relative to the content root.
posts_dir = "posts"
# CMS export file, relative to the content root.
export_file = "export.json"

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Deploy-preview verification (folio verify-deploy)
# ---------------------------------------------------------------------------
[deploy]
# Repository receiving the commit status.
owner = "owner"
repo = "site"
# Label shown next to the commit.
status_context = "Ghost Inspector E2E Tests"
test_api = "https://api.ghostinspector.com/v1"
status_api = "https://api.github.com"
# Seconds to wait for the suite run to finish.
timeout_secs = 600
"##
}
