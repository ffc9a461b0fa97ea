//! Configuration management for utapi
//!
//! The API key normally comes from the `UPLOADTHING_SECRET` environment
//! variable (optionally via a `.env` file). A TOML file under
//! `~/.config/utapi/` can supply the key and override the defaults.

use crate::error::{Error, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration directory name
const CONFIG_DIR: &str = "utapi";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Dotenv file read from the working directory
const DOTENV_FILE: &str = ".env";

/// Environment variable holding the API key
pub const SECRET_ENV: &str = "UPLOADTHING_SECRET";

/// Production API host
pub const DEFAULT_HOST: &str = "https://api.uploadthing.com";

/// Protocol version sent in `x-uploadthing-version`
pub const DEFAULT_VERSION: &str = "7.6.0";

/// Value sent in `x-uploadthing-be-adapter` unless overridden
pub const DEFAULT_BE_ADAPTER: &str = "utapi-rs";

/// Resolved settings the client runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadThingConfig {
    pub host: String,
    pub api_key: String,
    pub version: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Analytics header, omitted when empty
    pub fe_package: String,
    /// Analytics header, omitted when empty
    pub be_adapter: String,
}

impl UploadThingConfig {
    /// Config for the production host with the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            api_key: api_key.into(),
            version: DEFAULT_VERSION.to_string(),
            timeout: default_timeout(),
            fe_package: String::new(),
            be_adapter: DEFAULT_BE_ADAPTER.to_string(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from the environment, reading `./.env` first when present
    pub fn from_env() -> Result<Self> {
        load_dotenv(Path::new(DOTENV_FILE))?;

        let secret = std::env::var(SECRET_ENV).ok();
        let file = if config_exists() {
            Some(load_config()?)
        } else {
            None
        };

        Self::resolve(secret, file.as_ref())
    }

    /// Merge an environment secret with an optional config file.
    ///
    /// A non-empty secret wins over the file's `api_key`. Host, version and
    /// timeout come from the file when present.
    pub fn resolve(secret: Option<String>, file: Option<&ConfigFile>) -> Result<Self> {
        let from_file = file.and_then(|f| f.uploadthing.api_key.clone());
        let api_key = secret
            .filter(|s| !s.trim().is_empty())
            .or(from_file.filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| Error::MissingEnv(SECRET_ENV.to_string()))?;

        let mut config = Self::new(api_key);
        if let Some(file) = file {
            config = config
                .with_host(file.uploadthing.host.clone())
                .with_version(file.uploadthing.version.clone())
                .with_timeout(file.advanced_or_default().timeout);
            if let Some(fe_package) = &file.uploadthing.fe_package {
                config.fe_package = fe_package.clone();
            }
            if let Some(be_adapter) = &file.uploadthing.be_adapter {
                config.be_adapter = be_adapter.clone();
            }
        }

        validate(&config)?;
        Ok(config)
    }
}

/// Load variables from one dotenv file into the process environment.
///
/// Only `path` is read; parent directories are not searched. A missing file
/// is not an error and variables already set are left alone.
pub fn load_dotenv(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => {
            tracing::debug!(path = %path.display(), "no .env file, using process environment");
            Ok(())
        }
        Err(e) => Err(Error::Config(format!(
            "Failed to load {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Main configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub uploadthing: UploadThingSection,
    pub advanced: Option<AdvancedConfig>,
    pub logging: Option<LoggingConfig>,
    pub output: Option<OutputConfig>,
}

impl ConfigFile {
    pub fn advanced_or_default(&self) -> AdvancedConfig {
        self.advanced.clone().unwrap_or_default()
    }

    pub fn logging_or_default(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    pub fn output_or_default(&self) -> OutputConfig {
        self.output.clone().unwrap_or_default()
    }
}

/// UploadThing account settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadThingSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Value for `x-uploadthing-fe-package`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fe_package: Option<String>,
    /// Value for `x-uploadthing-be-adapter`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub be_adapter: Option<String>,
}

impl Default for UploadThingSection {
    fn default() -> Self {
        Self {
            api_key: None,
            host: default_host(),
            version: default_version(),
            fe_package: None,
            be_adapter: None,
        }
    }
}

/// Advanced configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_format")]
    pub default_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: default_output_format(),
        }
    }
}

// Default values
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_output_format() -> String {
    "table".to_string()
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR))
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Load configuration from file
pub fn load_config() -> Result<ConfigFile> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Err(Error::ConfigNotFound(config_path));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    parse_config(&content)
}

/// Parse configuration from TOML text
pub fn parse_config(content: &str) -> Result<ConfigFile> {
    toml::from_str(content)
        .map_err(|e| Error::InvalidConfig(format!("Failed to parse config file: {}", e)))
}

/// Save configuration to file
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let config_path = config_dir.join(CONFIG_FILE);
    let content = toml::to_string_pretty(config)?;

    fs::write(&config_path, content).map_err(|e| {
        Error::Config(format!("Failed to write config file: {}", e))
    })?;

    // The file may hold the API key: owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&config_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&config_path, perms)?;
    }

    Ok(config_path)
}

/// Validate a configuration file
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    let section = &config.uploadthing;

    if let Some(key) = &section.api_key {
        if key.trim().is_empty() {
            return Err(Error::InvalidInput("api_key cannot be empty".to_string()));
        }
    }

    validate_host(&section.host)?;

    if section.version.trim().is_empty() {
        return Err(Error::InvalidInput("version cannot be empty".to_string()));
    }

    if config.advanced_or_default().timeout == 0 {
        return Err(Error::InvalidInput("timeout must be greater than 0".to_string()));
    }

    if let Some(logging) = &config.logging {
        if !matches!(logging.format.as_str(), "pretty" | "json" | "compact") {
            return Err(Error::InvalidInput(format!(
                "Unknown log format '{}' (expected pretty, json or compact)",
                logging.format
            )));
        }
    }

    Ok(())
}

/// Validate resolved client settings
pub fn validate(config: &UploadThingConfig) -> Result<()> {
    if config.api_key.trim().is_empty() {
        return Err(Error::MissingEnv(SECRET_ENV.to_string()));
    }
    if !config.api_key.starts_with("sk_") {
        tracing::warn!("API key does not start with 'sk_', requests will likely be rejected");
    }

    validate_host(&config.host)?;

    if config.version.trim().is_empty() {
        return Err(Error::InvalidInput("version cannot be empty".to_string()));
    }
    if config.timeout == 0 {
        return Err(Error::InvalidInput("timeout must be greater than 0".to_string()));
    }

    Ok(())
}

fn validate_host(host: &str) -> Result<()> {
    if !(host.starts_with("https://") || host.starts_with("http://")) {
        return Err(Error::InvalidInput(format!(
            "Invalid host '{}' (expected an http:// or https:// URL)",
            host
        )));
    }
    Ok(())
}

/// Check if configuration exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}
