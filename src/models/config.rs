//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP retry and fallback behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// File download behavior
    #[serde(default)]
    pub download: DownloadConfig,

    /// Output and cache locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Base URLs of the mirrored sites
    #[serde(default)]
    pub sites: SitesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.retries == 0 {
            return Err(AppError::validation("fetch.retries must be > 0"));
        }
        if self.fetch.primary_suffix.is_empty() || self.fetch.fallback_suffix.is_empty() {
            return Err(AppError::validation(
                "fetch.primary_suffix and fetch.fallback_suffix must be set",
            ));
        }
        if self.download.max_concurrent == 0 {
            return Err(AppError::validation("download.max_concurrent must be > 0"));
        }
        if self.paths.output_dir.as_os_str().is_empty() {
            return Err(AppError::validation("paths.output_dir is empty"));
        }
        for site in Site::ALL {
            let base = self.sites.base_url(site);
            url::Url::parse(base).map_err(|e| {
                AppError::validation(format!("sites.{site} is not a valid URL ({base}): {e}"))
            })?;
        }
        Ok(())
    }
}

/// HTTP client, retry, and domain-fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Connect and idle-read timeout in seconds; also caps whole page and
    /// JSON requests
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per host before giving up on it
    #[serde(default = "defaults::retries")]
    pub retries: u32,

    /// Host suffix rewritten when the primary host is exhausted
    #[serde(default = "defaults::primary_suffix")]
    pub primary_suffix: String,

    /// Replacement suffix for the fallback host
    #[serde(default = "defaults::fallback_suffix")]
    pub fallback_suffix: String,

    /// Delay between failed attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retries: defaults::retries(),
            primary_suffix: defaults::primary_suffix(),
            fallback_suffix: defaults::fallback_suffix(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// File download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Files of one post downloaded at the same time (1 = sequential)
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the `<Domain>/<Artist>/<Service>/<Post>` tree
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    /// Append-only list of URLs that could not be fetched
    #[serde(default = "defaults::error_log")]
    pub error_log: PathBuf,

    /// Favorites caches and saved artist metadata
    #[serde(default = "defaults::config_dir")]
    pub config_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            error_log: defaults::error_log(),
            config_dir: defaults::config_dir(),
        }
    }
}

/// Base URLs of the supported sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitesConfig {
    #[serde(default = "defaults::kemono")]
    pub kemono: String,

    #[serde(default = "defaults::coomer")]
    pub coomer: String,
}

impl SitesConfig {
    /// Base URL (scheme and host, no trailing slash) for a site.
    pub fn base_url(&self, site: Site) -> &str {
        let url = match site {
            Site::Kemono => &self.kemono,
            Site::Coomer => &self.coomer,
        };
        url.trim_end_matches('/')
    }
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            kemono: defaults::kemono(),
            coomer: defaults::coomer(),
        }
    }
}

/// A mirrored site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Kemono,
    Coomer,
}

impl Site {
    pub const ALL: [Site; 2] = [Site::Kemono, Site::Coomer];

    pub fn name(&self) -> &'static str {
        match self {
            Site::Kemono => "kemono",
            Site::Coomer => "coomer",
        }
    }

    /// File name of the cached favorites list for this site.
    pub fn favorites_file(&self) -> String {
        format!("{}_favorites.json", self.name())
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod defaults {
    use std::path::PathBuf;

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; kemono-mirror/0.1)".into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn retries() -> u32 {
        3
    }
    pub fn primary_suffix() -> String {
        ".party".into()
    }
    pub fn fallback_suffix() -> String {
        ".su".into()
    }
    pub fn retry_delay() -> u64 {
        500
    }

    // Download defaults
    pub fn max_concurrent() -> usize {
        1
    }

    // Path defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from("Creators")
    }
    pub fn error_log() -> PathBuf {
        PathBuf::from("errors.txt")
    }
    pub fn config_dir() -> PathBuf {
        PathBuf::from("Config")
    }

    // Site defaults
    pub fn kemono() -> String {
        "https://kemono.party".into()
    }
    pub fn coomer() -> String {
        "https://coomer.party".into()
    }
}
