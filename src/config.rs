//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the site source directory next to `catalogue.toml`; every key is optional
//! and user values are merged over the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! public_dir = "public"      # Static asset root; cached images go under images/cached/
//! run_id_env = "RUN_ID"      # Environment variable holding the build-run identifier
//!
//! [store]
//! base_url = "https://play.google.com/store/apps/details?id="
//! pattern = '>([0-9.,KM+]*)</div><div class="[A-Za-z0-9]{0,10}">Downloads</div>'
//!
//! [releases]
//! api_base = "https://api.github.com"
//! token_env = "GITHUB_TOKEN" # Credential for the release API
//! per_page = 100             # Releases per page (API maximum is 100)
//! max_pages = 1              # Pages fetched when aggregating all releases
//!
//! [images]
//! project_size = 250         # Project artwork, square
//! icon_size = 32             # Extra-link icons
//! badge_size = 120           # Platform badges
//! favicon_size = 64          # Per-project favicon
//!
//! [badges]
//! play_store = "public/playStore.svg"
//! github = "https://github.githubassets.com/favicons/favicon-dark.svg"
//! favicon = "public/favicon.png"
//!
//! [http]
//! user_agent = "folio-build"
//! # timeout_secs = 30       # Unset: requests may wait indefinitely
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file inside the source directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Static asset root, relative to the source directory.
    pub public_dir: String,
    /// Environment variable holding the build-run identifier.
    pub run_id_env: String,
    pub store: StoreConfig,
    pub releases: ReleasesConfig,
    pub images: ImagesConfig,
    pub badges: BadgesConfig,
    pub http: HttpConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            run_id_env: "RUN_ID".to_string(),
            store: StoreConfig::default(),
            releases: ReleasesConfig::default(),
            images: ImagesConfig::default(),
            badges: BadgesConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.public_dir.trim().is_empty() {
            return Err(ConfigError::Validation("public_dir must not be empty".into()));
        }
        if !(1..=100).contains(&self.releases.per_page) {
            return Err(ConfigError::Validation(
                "releases.per_page must be 1-100".into(),
            ));
        }
        if self.releases.max_pages == 0 {
            return Err(ConfigError::Validation(
                "releases.max_pages must be at least 1".into(),
            ));
        }
        let sizes = [
            self.images.project_size,
            self.images.icon_size,
            self.images.badge_size,
            self.images.favicon_size,
        ];
        if sizes.contains(&0) {
            return Err(ConfigError::Validation(
                "images sizes must be non-zero".into(),
            ));
        }
        match regex::Regex::new(&self.store.pattern) {
            Ok(re) if re.captures_len() >= 2 => {}
            Ok(_) => {
                return Err(ConfigError::Validation(
                    "store.pattern must contain a capture group for the count".into(),
                ));
            }
            Err(e) => {
                return Err(ConfigError::Validation(format!(
                    "store.pattern is not a valid regex: {e}"
                )));
            }
        }
        Ok(())
    }
}

/// Package-store scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Detail page URL; the package identifier is appended.
    pub base_url: String,
    /// Regex whose first capture group is the abbreviated download count.
    pub pattern: String,
}

/// Default store page pattern: the count sits in the `div` right before the
/// `Downloads` label.
pub const DEFAULT_STORE_PATTERN: &str =
    r#">([0-9.,KM+]*)</div><div class="[A-Za-z0-9]{0,10}">Downloads</div>"#;

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://play.google.com/store/apps/details?id=".to_string(),
            pattern: DEFAULT_STORE_PATTERN.to_string(),
        }
    }
}

/// Release API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleasesConfig {
    pub api_base: String,
    /// Environment variable holding the API credential.
    pub token_env: String,
    pub per_page: u32,
    /// Upper bound on pages fetched when aggregating all releases.
    pub max_pages: u32,
}

impl Default for ReleasesConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            per_page: 100,
            max_pages: 1,
        }
    }
}

/// Target edge lengths (pixels) for cached images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub project_size: u32,
    pub icon_size: u32,
    pub badge_size: u32,
    pub favicon_size: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            project_size: 250,
            icon_size: 32,
            badge_size: 120,
            favicon_size: 64,
        }
    }
}

/// Shared badge artwork. Values starting with `http://` or `https://` are
/// fetched; anything else is a path relative to the source directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BadgesConfig {
    pub play_store: String,
    pub github: String,
    /// Overlay composed onto each project favicon.
    pub favicon: String,
}

impl Default for BadgesConfig {
    fn default() -> Self {
        Self {
            play_store: "public/playStore.svg".to_string(),
            github: "https://github.githubassets.com/favicons/favicon-dark.svg".to_string(),
            favicon: "public/favicon.png".to_string(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Per-request timeout. When absent, requests are not bounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "folio-build".to_string(),
            timeout_secs: None,
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
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
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

/// Load config from `config.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# folio-build configuration
# ========================
# Every key is optional. Values shown are the defaults.

# Static asset root, relative to the source directory. Cached images are
# written to <public_dir>/images/cached/ and referenced as /images/cached/...
public_dir = "public"

# Environment variable holding the build-run identifier. Cached file names
# embed it, so changing it invalidates every cached image. When the variable
# is unset, a digest of catalogue.toml is used instead.
run_id_env = "RUN_ID"

# ---------------------------------------------------------------------------
# Package store: download estimate scraped from the public detail page
# ---------------------------------------------------------------------------
[store]
# The package identifier is appended to this URL.
base_url = "https://play.google.com/store/apps/details?id="
# First capture group must hold the abbreviated count (e.g. 10K+).
pattern = '>([0-9.,KM+]*)</div><div class="[A-Za-z0-9]{0,10}">Downloads</div>'

# ---------------------------------------------------------------------------
# Source hosting: release asset download counters
# ---------------------------------------------------------------------------
[releases]
api_base = "https://api.github.com"
# Environment variable holding the API credential.
token_env = "GITHUB_TOKEN"
# Releases per page (the API caps this at 100).
per_page = 100
# Pages fetched when a project counts all releases. Releases beyond
# per_page * max_pages are not counted.
max_pages = 1

# ---------------------------------------------------------------------------
# Cached image sizes (pixels, images are fitted into a square)
# ---------------------------------------------------------------------------
[images]
project_size = 250
icon_size = 32
badge_size = 120
favicon_size = 64

# ---------------------------------------------------------------------------
# Shared badge artwork: URLs are fetched, other values are local paths
# ---------------------------------------------------------------------------
[badges]
play_store = "public/playStore.svg"
github = "https://github.githubassets.com/favicons/favicon-dark.svg"
# Overlay composed onto each project favicon.
favicon = "public/favicon.png"

# ---------------------------------------------------------------------------
# HTTP client
# ---------------------------------------------------------------------------
[http]
user_agent = "folio-build"
# Per-request timeout in seconds. Unset means a hung request stalls the build.
# timeout_secs = 30
"##
}
