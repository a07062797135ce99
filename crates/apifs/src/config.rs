//! On-disk configuration
//!
//! Loaded from `<config_dir>/apifs/config.toml` unless a path is given. Every
//! field has a default, so an absent file is the same as an empty one. The
//! access token never lives here; it comes from the command line or the
//! environment.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::vfs::{COLLECTION_TTL, MAX_TTL};

pub const CONFIG_DIR_NAME: &str = "apifs";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default API version header value
pub const DEFAULT_API_VERSION: &str = "2015-07-06";

const LIVE_URL: &str = "https://api.gocardless.com";
const SANDBOX_URL: &str = "https://api-sandbox.gocardless.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("no collections configured")]
    NoCollections,
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),
    #[error("collection configured twice: {0}")]
    DuplicateCollection(String),
    #[error("cache ttl_secs {0} exceeds the maximum of {1}")]
    InvalidTtl(u64, u64),
    #[error("unknown API environment: {0} (expected `live` or `sandbox`)")]
    UnknownEnvironment(String),
    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// Which API deployment to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Live,
    #[default]
    Sandbox,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Live => LIVE_URL,
            Environment::Sandbox => SANDBOX_URL,
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Environment::Live),
            "sandbox" => Ok(Environment::Sandbox),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub environment: Environment,
    /// Overrides the environment's URL when set
    pub base_url: Option<String>,
    /// Value of the `GoCardless-Version` header
    pub version: String,
    /// Page size for listings; the API default applies when unset
    pub list_limit: Option<u32>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            base_url: None,
            version: DEFAULT_API_VERSION.to_string(),
            list_limit: None,
        }
    }
}

impl ApiConfig {
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let raw = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url());
        Url::parse(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for listings and object bodies in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: COLLECTION_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Filesystem name reported to the kernel
    pub fs_name: String,
    /// Unmount automatically when the process exits
    pub auto_unmount: bool,
    /// Let users other than the mounting one access the mount
    pub allow_other: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fs_name: "apifs".to_string(),
            auto_unmount: false,
            allow_other: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Collections exposed under the mount root, in listing order
    pub collections: Vec<String>,
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub mount: MountConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collections: ["customers", "payments", "mandates", "payouts", "events"]
                .into_iter()
                .map(String::from)
                .collect(),
            api: ApiConfig::default(),
            cache: CacheConfig::default(),
            mount: MountConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from an explicit path, which must exist
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the default location if it exists, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!("loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collections.is_empty() {
            return Err(ConfigError::NoCollections);
        }
        let mut seen = HashSet::new();
        for name in &self.collections {
            if name.is_empty() || name.contains('/') || name == "." || name == ".." {
                return Err(ConfigError::InvalidCollection(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateCollection(name.clone()));
            }
        }
        if self.cache.ttl_secs > MAX_TTL.as_secs() {
            return Err(ConfigError::InvalidTtl(
                self.cache.ttl_secs,
                MAX_TTL.as_secs(),
            ));
        }
        self.api.base_url()?;
        Ok(())
    }
}
