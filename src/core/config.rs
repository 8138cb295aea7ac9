//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.globemate/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::page::PageId;
use crate::core::router::{DEFAULT_PAGE, FadeTimings, InitFailurePolicy, RouterOptions};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GlobeMateConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub transition: TransitionConfig,
    #[serde(default)]
    pub toasts: ToastConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_page: Option<String>,
    pub on_init_error: Option<InitFailurePolicy>,
    pub storage_dir: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PagesConfig {
    pub source: Option<PageSourceKind>,
    pub base: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TransitionConfig {
    pub fade_out_ms: Option<u64>,
    pub fade_in_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ToastConfig {
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    pub countries_url: Option<String>,
    pub rates_url: Option<String>,
    pub geocode_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSourceKind {
    Embedded,
    Dir,
    Http,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_FADE_MS: u64 = 300;
pub const DEFAULT_TOAST_MS: u64 = 3500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1";
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

/// Where page fragments are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Embedded,
    Dir(PathBuf),
    Http(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub default_page: PageId,
    pub init_policy: InitFailurePolicy,
    pub storage_dir: PathBuf,
    pub log_level: String,
    pub pages: PageSource,
    pub fade: FadeTimings,
    pub toast_duration: Duration,
    pub countries_url: String,
    pub rates_url: String,
    pub geocode_url: String,
    pub timeout: Duration,
}

impl ResolvedConfig {
    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            default_page: self.default_page.clone(),
            init_policy: self.init_policy,
            fade: self.fade,
            toast_duration: self.toast_duration,
        }
    }
}

/// Values from CLI flags (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub pages: Option<String>,
    pub page: Option<String>,
    pub storage: Option<String>,
    pub on_init_error: Option<InitFailurePolicy>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.globemate`.
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".globemate"))
}

/// Returns the path to `~/.globemate/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    app_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.globemate/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `GlobeMateConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<GlobeMateConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(GlobeMateConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<GlobeMateConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(GlobeMateConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: GlobeMateConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# GlobeMate Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# default_page = "home"              # Or set GLOBEMATE_DEFAULT_PAGE
# on_init_error = "isolate"          # "isolate" or "propagate"
# storage_dir = "~/.globemate/data"  # Or set GLOBEMATE_STORAGE_DIR
# log_level = "debug"                # "error", "warn", "info", "debug", "trace"

# [pages]
# source = "embedded"                # "embedded", "dir" or "http"
# base = "./pages"                   # Directory or URL, or set GLOBEMATE_PAGES

# [transition]
# fade_out_ms = 300
# fade_in_ms = 300

# [toasts]
# duration_ms = 3500

# [api]
# countries_url = "https://restcountries.com/v3.1"
# rates_url = "https://api.exchangerate-api.com/v4"
# geocode_url = "https://nominatim.openstreetmap.org"
# timeout_secs = 15
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_TEMPLATE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &GlobeMateConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// `resolve` with an injectable environment lookup.
pub fn resolve_with_env(
    config: &GlobeMateConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Default page: CLI → env → config → "home"
    let default_page = cli
        .page
        .clone()
        .or_else(|| env("GLOBEMATE_DEFAULT_PAGE"))
        .or_else(|| config.general.default_page.clone())
        .unwrap_or_else(|| DEFAULT_PAGE.to_string());

    let init_policy = cli
        .on_init_error
        .or(config.general.on_init_error)
        .unwrap_or_default();

    // Storage: CLI → env → config → ~/.globemate/data
    let storage_dir = cli
        .storage
        .clone()
        .or_else(|| env("GLOBEMATE_STORAGE_DIR"))
        .or_else(|| config.general.storage_dir.clone())
        .map(|dir| expand_home(&dir))
        .or_else(|| app_dir().map(|d| d.join("data")))
        .unwrap_or_else(|| PathBuf::from(".globemate-data"));

    // Pages: a CLI/env base picks its kind from its shape; the file may
    // name the kind explicitly.
    let pages = match cli.pages.clone().or_else(|| env("GLOBEMATE_PAGES")) {
        Some(base) => page_source_from_base(&base),
        None => match (config.pages.source, config.pages.base.as_deref()) {
            (Some(PageSourceKind::Embedded), _) | (None, None) => PageSource::Embedded,
            (Some(PageSourceKind::Http), Some(base)) => PageSource::Http(base.to_string()),
            (Some(PageSourceKind::Dir), Some(base)) => PageSource::Dir(expand_home(base)),
            (None, Some(base)) => page_source_from_base(base),
            (Some(kind), None) => {
                warn!("[pages] source = {kind:?} needs a base, using embedded pages");
                PageSource::Embedded
            }
        },
    };

    let fade = FadeTimings {
        fade_out: Duration::from_millis(config.transition.fade_out_ms.unwrap_or(DEFAULT_FADE_MS)),
        fade_in: Duration::from_millis(config.transition.fade_in_ms.unwrap_or(DEFAULT_FADE_MS)),
    };

    ResolvedConfig {
        default_page: PageId::from(default_page),
        init_policy,
        storage_dir,
        log_level: config
            .general
            .log_level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        pages,
        fade,
        toast_duration: Duration::from_millis(
            config.toasts.duration_ms.unwrap_or(DEFAULT_TOAST_MS),
        ),
        countries_url: config
            .api
            .countries_url
            .clone()
            .unwrap_or_else(|| DEFAULT_COUNTRIES_URL.to_string()),
        rates_url: config
            .api
            .rates_url
            .clone()
            .unwrap_or_else(|| DEFAULT_RATES_URL.to_string()),
        geocode_url: config
            .api
            .geocode_url
            .clone()
            .unwrap_or_else(|| DEFAULT_GEOCODE_URL.to_string()),
        timeout: Duration::from_secs(config.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    }
}

/// URLs become HTTP sources, anything else is a directory.
fn page_source_from_base(base: &str) -> PageSource {
    if base.starts_with("http://") || base.starts_with("https://") {
        PageSource::Http(base.to_string())
    } else {
        PageSource::Dir(expand_home(base))
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
