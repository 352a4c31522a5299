//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable overriding `slack.bot_token`.
pub const ENV_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";
/// Environment variable overriding `slack.channel_id`.
pub const ENV_CHANNEL_ID: &str = "SLACK_CHANNEL_ID";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which appointment types and locations to watch
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// HTTP and loop timing settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Slack delivery settings
    #[serde(default)]
    pub slack: SlackConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or return defaults if the file does not exist.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config file {:?} not found. Using defaults.", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply `SLACK_BOT_TOKEN` / `SLACK_CHANNEL_ID` from the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_BOT_TOKEN).ok(),
            std::env::var(ENV_CHANNEL_ID).ok(),
        );
    }

    fn apply_overrides(&mut self, bot_token: Option<String>, channel_id: Option<String>) {
        if let Some(token) = bot_token.filter(|t| !t.trim().is_empty()) {
            self.slack.bot_token = Some(token);
        }
        if let Some(channel) = channel_id.filter(|c| !c.trim().is_empty()) {
            self.slack.channel_id = Some(channel);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.polling.user_agent.trim().is_empty() {
            return Err(AppError::validation("polling.user_agent is empty"));
        }
        if self.polling.interval_secs == 0 {
            return Err(AppError::validation("polling.interval_secs must be > 0"));
        }
        if self.polling.timeout_secs == 0 {
            return Err(AppError::validation("polling.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.polling.portal_base)
            .map_err(|e| AppError::validation(format!("polling.portal_base: {e}")))?;
        Ok(())
    }
}

/// Operator filters over the appointment catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Appointment types to watch (empty means every supported type)
    #[serde(default)]
    pub appointment_types: Vec<String>,

    /// Single location to watch (absent means every location)
    #[serde(default)]
    pub location: Option<String>,
}

/// HTTP client and loop timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Sleep between poll cycles, in seconds
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Pause after the portal looks down, in seconds
    #[serde(default = "defaults::outage_pause")]
    pub outage_pause_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Scheme and host of the booking portal
    #[serde(default = "defaults::portal_base")]
    pub portal_base: String,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            outage_pause_secs: defaults::outage_pause(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            portal_base: defaults::portal_base(),
        }
    }
}

/// Slack Web API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`)
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Channel to post into
    #[serde(default)]
    pub channel_id: Option<String>,

    /// Web API base URL
    #[serde(default = "defaults::slack_api_base")]
    pub api_base: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel_id: None,
            api_base: defaults::slack_api_base(),
        }
    }
}

mod defaults {
    pub fn interval() -> u64 {
        10
    }
    pub fn outage_pause() -> u64 {
        30 * 60
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; mvc-watch/0.1)".into()
    }
    pub fn portal_base() -> String {
        "https://telegov.njportal.com".into()
    }
    pub fn slack_api_base() -> String {
        "https://slack.com/api".into()
    }
}
