use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use std::fs;
use common::UploadProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
    #[serde(default = "default_jobs_path")]
    pub jobs_path: String,
    #[serde(default = "default_media_prefix")]
    pub media_prefix: String,
    #[serde(default = "default_validate_path")]
    pub validate_path: String,
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Unset means requests may wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String { common::DEFAULT_API_URL.to_string() }
fn default_upload_path() -> String { common::UPLOAD_PATH.to_string() }
fn default_jobs_path() -> String { common::JOBS_PATH.to_string() }
fn default_media_prefix() -> String { common::MEDIA_PREFIX.to_string() }
fn default_validate_path() -> String { common::VALIDATE_PATH.to_string() }
fn default_health_path() -> String { common::HEALTH_PATH.to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            upload_path: default_upload_path(),
            jobs_path: default_jobs_path(),
            media_prefix: default_media_prefix(),
            validate_path: default_validate_path(),
            health_path: default_health_path(),
            request_timeout_secs: None,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
}

fn default_poll_interval() -> u64 { common::POLL_INTERVAL_MS }

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_profile")]
    pub default_profile: String,
}

fn default_max_file_size() -> u64 { common::MAX_FILE_SIZE }
fn default_profile() -> String { common::DEFAULT_PROFILE.to_string() }

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            default_profile: default_profile(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub profiles: Vec<UploadProfile>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Detect file type by extension and load
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        let config = match ext {
            "yaml" | "yml" => Self::from_yaml_file(path)?,
            "toml" => Self::from_toml_file(path)?,
            _ => return Err(anyhow::anyhow!("Unsupported config file format. Use .yaml, .yml, or .toml")),
        };
        config.validate().with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(config)
    }

    /// Resolve the effective configuration: explicit path, then
    /// `SPORTSVOICE_CONFIG`, then the per-user file if present, then defaults.
    /// `SPORTSVOICE_API_URL` always wins for the base URL.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = Self::locate(explicit) {
            config.merge(Config::from_file(&path)?);
        }

        if let Ok(url) = std::env::var("SPORTSVOICE_API_URL") {
            config.server.base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// The file `load` would read, if any.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => match std::env::var("SPORTSVOICE_CONFIG") {
                Ok(p) => Some(PathBuf::from(p)),
                Err(_) => expand_home(common::USER_CONFIG_PATH).filter(|p| p.exists()),
            },
        }
    }

    /// Merge with another config, preferring values from other
    pub fn merge(&mut self, other: Config) {
        // Server settings
        self.server.base_url = other.server.base_url;
        self.server.upload_path = other.server.upload_path;
        self.server.jobs_path = other.server.jobs_path;
        self.server.media_prefix = other.server.media_prefix;
        self.server.validate_path = other.server.validate_path;
        self.server.health_path = other.server.health_path;
        if other.server.request_timeout_secs.is_some() {
            self.server.request_timeout_secs = other.server.request_timeout_secs;
        }

        self.poll.interval_ms = other.poll.interval_ms;

        self.upload.max_file_size = other.upload.max_file_size;
        self.upload.default_profile = other.upload.default_profile;

        // Logging settings
        self.logging.level = other.logging.level;
        if other.logging.output.is_some() {
            self.logging.output = other.logging.output;
        }

        // Profiles - append, later entries win on lookup
        self.profiles.extend(other.profiles);
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.base_url.trim().is_empty() {
            anyhow::bail!("server.base_url must not be empty");
        }
        if self.poll.interval_ms == 0 {
            anyhow::bail!("poll.interval_ms must be greater than zero");
        }
        if self.upload.max_file_size == 0 {
            anyhow::bail!("upload.max_file_size must be greater than zero");
        }
        for profile in &self.profiles {
            profile.validate().map_err(|e| anyhow::anyhow!(e))?;
        }
        if self.profile(&self.upload.default_profile).is_none() {
            anyhow::bail!("upload.default_profile '{}' is not defined", self.upload.default_profile);
        }
        Ok(())
    }

    /// Built-in profiles overlaid with the configured ones.
    pub fn profiles(&self) -> Vec<UploadProfile> {
        common::merge_profiles(&self.profiles)
    }

    pub fn profile(&self, name: &str) -> Option<UploadProfile> {
        self.profiles().into_iter().find(|p| p.name == name)
    }
}

fn expand_home(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => std::env::var_os("HOME").map(|home| PathBuf::from(home).join(rest)),
        None => Some(PathBuf::from(path)),
    }
}
