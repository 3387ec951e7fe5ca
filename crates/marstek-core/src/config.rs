// Coordinator configuration and account credentials.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Marstek account credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Cache freshness window.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
/// Assumed token lifetime; the vendor never reports one.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
/// Refresh the token this long before assumed expiry.
pub const TOKEN_REFRESH_BUFFER: Duration = Duration::from_secs(300);
/// Floor of the adaptive poll interval.
pub const ADAPTIVE_INTERVAL_MIN: Duration = Duration::from_secs(60);
/// Ceiling of the adaptive poll interval.
pub const ADAPTIVE_INTERVAL_MAX: Duration = Duration::from_secs(300);
/// Consecutive transient failures before the breaker opens.
pub const BREAKER_FAILURE_THRESHOLD: u32 = 3;
/// How long an open breaker suppresses calls.
pub const BREAKER_OPEN_COOLDOWN: Duration = Duration::from_secs(300);

/// Accepted range for `base_interval`, in seconds.
pub const BASE_INTERVAL_RANGE: (u64, u64) = (10, 3600);

/// Everything the [`Coordinator`](crate::Coordinator) needs to run.
///
/// `new` fills in the vendor-calibrated defaults; override fields
/// before handing the config over. `validate` is called by the
/// coordinator constructor, so a hand-tuned config cannot silently
/// misbehave.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub base_url: Url,
    pub credentials: Credentials,
    /// Scheduled poll cadence before adaptive widening.
    pub base_interval: Duration,
    pub cache_ttl: Duration,
    pub token_ttl: Duration,
    pub token_refresh_buffer: Duration,
    pub adaptive_min: Duration,
    pub adaptive_max: Duration,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl PollerConfig {
    pub fn new(base_url: Url, credentials: Credentials) -> Self {
        let transport = marstek_api::TransportConfig::default();
        Self {
            base_url,
            credentials,
            base_interval: ADAPTIVE_INTERVAL_MIN,
            cache_ttl: DEFAULT_CACHE_TTL,
            token_ttl: DEFAULT_TOKEN_TTL,
            token_refresh_buffer: TOKEN_REFRESH_BUFFER,
            adaptive_min: ADAPTIVE_INTERVAL_MIN,
            adaptive_max: ADAPTIVE_INTERVAL_MAX,
            breaker_threshold: BREAKER_FAILURE_THRESHOLD,
            breaker_cooldown: BREAKER_OPEN_COOLDOWN,
            connect_timeout: transport.connect_timeout,
            request_timeout: transport.timeout,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let (min, max) = BASE_INTERVAL_RANGE;
        let secs = self.base_interval.as_secs();
        if secs < min || secs > max {
            return Err(CoreError::Config {
                message: format!("base_interval must be {min}-{max} seconds, got {secs}"),
            });
        }
        if self.adaptive_min > self.adaptive_max {
            return Err(CoreError::Config {
                message: "adaptive_min must not exceed adaptive_max".into(),
            });
        }
        if self.breaker_threshold == 0 {
            return Err(CoreError::Config {
                message: "breaker_threshold must be at least 1".into(),
            });
        }
        if self.credentials.email.is_empty() {
            return Err(CoreError::Config {
                message: "account email is required".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> PollerConfig {
        PollerConfig::new(
            Url::parse(marstek_api::client::DEFAULT_BASE_URL).unwrap(),
            Credentials {
                email: "user@example.com".into(),
                password: SecretString::from("hunter2".to_string()),
            },
        )
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_interval() {
        let mut cfg = config();
        cfg.base_interval = Duration::from_secs(5);
        assert!(matches!(cfg.validate(), Err(CoreError::Config { .. })));

        cfg.base_interval = Duration::from_secs(3601);
        assert!(matches!(cfg.validate(), Err(CoreError::Config { .. })));
    }

    #[test]
    fn rejects_empty_email() {
        let mut cfg = config();
        cfg.credentials.email.clear();
        assert!(matches!(cfg.validate(), Err(CoreError::Config { .. })));
    }
}
