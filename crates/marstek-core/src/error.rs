// Error taxonomy of the polling layer.
//
// The coordinator collapses the wire-level errors into a handful of
// consumer classes: fatal credential problems, vendor permission
// denials, transient upstream failures (absorbed by the cache and
// breaker), configuration problems, and "no data at all" when a failure
// hits before the cache was ever populated.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Credentials were rejected. Fatal, never retried automatically.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// The account has no access permission for this data.
    #[error("no access permission: {message}")]
    Permission { message: String },

    /// Upstream failure expected to clear on its own.
    #[error("transient upstream failure: {message}")]
    Transient { message: String },

    /// No snapshot available: the failure struck before any data was cached.
    #[error("no device data available ({reason})")]
    NoData { reason: String },

    /// Invalid coordinator configuration.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Fatal errors stop the polling loop from making progress; they
    /// require operator intervention (fix credentials or permissions).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Permission { .. })
    }
}

impl From<marstek_api::Error> for CoreError {
    fn from(err: marstek_api::Error) -> Self {
        match err {
            marstek_api::Error::Authentication { message } => Self::Authentication { message },
            marstek_api::Error::Permission { code } => Self::Permission {
                message: format!("vendor denied access (code {code})"),
            },
            marstek_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid base URL: {e}"),
            },
            // Rate limits, 5xx, timeouts, garbled bodies, and token
            // rejections that survived a refresh are all expected to
            // clear on their own.
            other if other.is_invalid_token() || other.is_transient() => Self::Transient {
                message: other.to_string(),
            },
            // Non-transient transport failures (TLS, protocol, body
            // decoding) need operator attention, not retries.
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_consumer_classes() {
        let auth = CoreError::from(marstek_api::Error::Authentication {
            message: "password error".into(),
        });
        assert!(matches!(auth, CoreError::Authentication { .. }));
        assert!(auth.is_fatal());

        let perm = CoreError::from(marstek_api::Error::Permission { code: "8".into() });
        assert!(matches!(perm, CoreError::Permission { .. }));
        assert!(perm.is_fatal());

        let token = CoreError::from(marstek_api::Error::InvalidToken { code: "401".into() });
        assert!(matches!(token, CoreError::Transient { .. }));
        assert!(!token.is_fatal());

        let limited = CoreError::from(marstek_api::Error::RateLimited);
        assert!(matches!(limited, CoreError::Transient { .. }));

        let garbled = CoreError::from(marstek_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        });
        assert!(matches!(garbled, CoreError::Transient { .. }));
    }
}
