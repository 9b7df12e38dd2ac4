//! Settings file management

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::errors::AutomationError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

pub const ENV_API_URL: &str = "MAILFLOW_API_URL";
pub const ENV_API_TOKEN: &str = "MAILFLOW_API_TOKEN";
pub const ENV_LOG_LEVEL: &str = "MAILFLOW_LOG_LEVEL";

/// CLI settings
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log output configuration
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Automation API configuration
    #[serde(default)]
    pub gateway: GatewaySettings,
}

impl Settings {
    /// Load settings from a file, falling back to defaults when it does not
    /// exist. Environment overrides are applied afterwards.
    pub async fn load(file: &File) -> Result<Self, AutomationError> {
        let mut settings = if file.exists().await {
            debug!("Loading settings from {}", file.path().display());
            file.read_json::<Settings>().await?
        } else {
            debug!(
                "No settings at {}, using defaults",
                file.path().display()
            );
            Settings::default()
        };

        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `MAILFLOW_*` overrides from the given lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AutomationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.gateway.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|t| !t.is_empty()) {
            self.gateway.api_token = Some(SecretString::from(token));
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level.parse().map_err(AutomationError::ConfigError)?;
        }
        Ok(())
    }

    /// Reject settings the gateway could not work with
    pub fn validate(&self) -> Result<(), AutomationError> {
        let url = url::Url::parse(&self.gateway.base_url).map_err(|e| {
            AutomationError::ConfigError(format!(
                "Invalid gateway URL '{}': {}",
                self.gateway.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AutomationError::ConfigError(format!(
                "Gateway URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if url.scheme() == "http" && self.gateway.api_token.is_some() {
            warn!("API token will be sent over plain http");
        }
        if self.gateway.timeout_secs == 0 {
            return Err(AutomationError::ConfigError(
                "Gateway timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Log output settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,

    /// Also write a daily rolling file under the logs directory
    #[serde(default)]
    pub to_file: bool,
}

/// Automation API settings
#[derive(Debug, Deserialize)]
pub struct GatewaySettings {
    /// Base URL for the automation API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Bearer token, if the API requires one
    #[serde(default, deserialize_with = "deserialize_token")]
    pub api_token: Option<SecretString>,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn deserialize_token<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let token = Option::<String>::deserialize(deserializer)?;
    Ok(token.filter(|t| !t.is_empty()).map(SecretString::from))
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            api_token: None,
        }
    }
}
