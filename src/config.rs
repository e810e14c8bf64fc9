use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured service endpoint
pub const ENDPOINT_ENV: &str = "BOOKWISE_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

pub const DEFAULT_GREETING: &str = "Hello! I'm your personal book recommendation assistant. Tell me about your reading preferences, favorite genres, or what kind of mood you're in for your next read!";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the recommendation service
    pub endpoint: String,

    /// Transport timeout for a single chat request, in seconds
    pub request_timeout_secs: u64,

    /// Assistant message every new conversation starts with
    pub greeting: String,

    /// UI preferences
    pub ui: UiConfig,

    /// BookWise home directory
    #[serde(skip)]
    pub bookwise_home: PathBuf,

    /// File this configuration was loaded from (or will be saved to)
    #[serde(skip)]
    pub config_path: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub placeholder: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_timestamps: true,
            placeholder: "Ask for book recommendations...".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        let bookwise_home = home.join(".bookwise");
        let config_path = bookwise_home.join("config.toml");

        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 60,
            greeting: DEFAULT_GREETING.to_string(),
            ui: UiConfig::default(),
            bookwise_home,
            config_path,
        }
    }
}

impl Config {
    /// Load configuration from `~/.bookwise/config.toml` (or `path` when given)
    /// and apply the endpoint override from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let bookwise_home = match path.and_then(Path::parent) {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => dirs::home_dir()
                .context("Could not find home directory")?
                .join(".bookwise"),
        };
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| bookwise_home.join("config.toml"));

        fs::create_dir_all(&bookwise_home)
            .context("Failed to create .bookwise directory")?;

        let mut config = Self::from_file(&config_path)?;
        config.bookwise_home = bookwise_home;
        config.config_path = config_path;
        config.apply_endpoint_override(std::env::var(ENDPOINT_ENV).ok());

        Ok(config)
    }

    /// Parse a config file, falling back to defaults when it does not exist
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&self.config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Replace the endpoint when an override is present and non-blank
    pub fn apply_endpoint_override(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint {
            let endpoint = endpoint.trim();
            if !endpoint.is_empty() {
                self.endpoint = endpoint.to_string();
            }
        }
    }

    /// URL the chat requests are posted to
    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.endpoint.trim_end_matches('/'))
    }

    /// URL of the service's liveness route
    pub fn health_url(&self) -> String {
        format!("{}/hello_world", self.endpoint.trim_end_matches('/'))
    }

    /// Directory the rolling log files are written to
    pub fn log_dir(&self) -> PathBuf {
        self.bookwise_home.join("logs")
    }
}
