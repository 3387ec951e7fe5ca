//! Shared configuration for the Marstek CLI.
//!
//! TOML config file, environment overrides, credential resolution
//! (env var + keyring + plaintext), and translation to
//! `marstek_core::PollerConfig`.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use marstek_core::{Credentials, PollerConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for account '{email}'")]
    NoPassword { email: String },

    #[error("no account email configured")]
    NoEmail,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Marstek account email.
    pub email: Option<String>,

    /// Account password (plaintext — prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Vendor API base URL; rarely changed.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Polling tunables.
    #[serde(default)]
    pub poll: PollSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            password_env: None,
            base_url: default_base_url(),
            poll: PollSettings::default(),
        }
    }
}

fn default_base_url() -> String {
    marstek_api::client::DEFAULT_BASE_URL.into()
}

/// The `[poll]` table. Everything here is optional and falls back to the
/// coordinator defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PollSettings {
    /// Scheduled poll cadence in seconds (10-3600).
    pub base_interval: Option<u64>,

    /// Cache freshness window in seconds.
    pub cache_ttl: Option<u64>,

    /// Floor of the adaptive interval, seconds.
    pub adaptive_min: Option<u64>,

    /// Ceiling of the adaptive interval, seconds.
    pub adaptive_max: Option<u64>,

    /// Consecutive failures before the circuit breaker opens.
    pub breaker_threshold: Option<u32>,

    /// Open-breaker cooldown in seconds.
    pub breaker_cooldown: Option<u64>,

    /// TCP connect timeout in seconds.
    pub connect_timeout: Option<u64>,

    /// Total per-request timeout in seconds.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "marstek", "marstek").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("marstek");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the full Config from file + environment (`MARSTEK_*`).
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("MARSTEK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Keyring service name for stored passwords.
const KEYRING_SERVICE: &str = "marstek";

/// Resolve the account password from the credential chain.
pub fn resolve_password(config: &Config, email: &str) -> Result<SecretString, ConfigError> {
    // 1. Configured env var
    if let Some(ref env_name) = config.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, email) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref password) = config.password {
        return Ok(SecretString::from(password.clone()));
    }

    Err(ConfigError::NoPassword {
        email: email.into(),
    })
}

/// Store the account password in the system keyring.
pub fn store_password(email: &str, password: &str) -> Result<(), ConfigError> {
    let entry =
        keyring::Entry::new(KEYRING_SERVICE, email).map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })?;
    entry.set_password(password).map_err(|e| ConfigError::Validation {
        field: "keyring".into(),
        reason: e.to_string(),
    })
}

// ── Translation to the coordinator config ───────────────────────────

/// Build a `PollerConfig` from the loaded config.
pub fn to_poller_config(config: &Config) -> Result<PollerConfig, ConfigError> {
    let email = config.email.clone().ok_or(ConfigError::NoEmail)?;
    let password = resolve_password(config, &email)?;

    let base_url: url::Url = config
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {}", config.base_url),
        })?;

    let mut poller = PollerConfig::new(base_url, Credentials { email, password });

    let poll = &config.poll;
    if let Some(secs) = poll.base_interval {
        poller.base_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = poll.cache_ttl {
        poller.cache_ttl = Duration::from_secs(secs);
    }
    if let Some(secs) = poll.adaptive_min {
        poller.adaptive_min = Duration::from_secs(secs);
    }
    if let Some(secs) = poll.adaptive_max {
        poller.adaptive_max = Duration::from_secs(secs);
    }
    if let Some(n) = poll.breaker_threshold {
        poller.breaker_threshold = n;
    }
    if let Some(secs) = poll.breaker_cooldown {
        poller.breaker_cooldown = Duration::from_secs(secs);
    }
    if let Some(secs) = poll.connect_timeout {
        poller.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = poll.timeout {
        poller.request_timeout = Duration::from_secs(secs);
    }

    poller.validate().map_err(|e| ConfigError::Validation {
        field: "poll".into(),
        reason: e.to_string(),
    })?;
    Ok(poller)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_point_at_the_vendor_cloud() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://eap.hememess.com");
        assert!(config.email.is_none());
    }

    #[test]
    fn poll_table_overrides_apply() {
        let config: Config = toml::from_str(
            r#"
            email = "user@example.com"
            password = "hunter2"

            [poll]
            base_interval = 120
            breaker_threshold = 5
            "#,
        )
        .unwrap();

        let poller = to_poller_config(&config).unwrap();
        assert_eq!(poller.base_interval, Duration::from_secs(120));
        assert_eq!(poller.breaker_threshold, 5);
        assert_eq!(poller.cache_ttl, Duration::from_secs(30));
    }

    #[test]
    fn missing_email_is_rejected() {
        let config = Config::default();
        assert!(matches!(to_poller_config(&config), Err(ConfigError::NoEmail)));
    }

    #[test]
    fn out_of_range_interval_is_rejected() {
        let config: Config = toml::from_str(
            r#"
            email = "user@example.com"
            password = "hunter2"

            [poll]
            base_interval = 5
            "#,
        )
        .unwrap();

        assert!(matches!(
            to_poller_config(&config),
            Err(ConfigError::Validation { .. })
        ));
    }
}
