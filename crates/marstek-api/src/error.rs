use thiserror::Error;

/// Top-level error type for the `marstek-api` crate.
///
/// Covers every failure mode at the wire level: login rejection, token
/// expiry, vendor error codes, transport, and malformed payloads.
/// `marstek-core` maps these into its domain taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong credentials, malformed login response).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The device-list call was rejected because the token is expired
    /// or otherwise invalid (vendor codes `-1`, `401`, `403`).
    #[error("Invalid or expired token (code {code})")]
    InvalidToken { code: String },

    /// The account has no access permission (vendor code `8`).
    #[error("No access permission (code {code})")]
    Permission { code: String },

    // ── Vendor API ──────────────────────────────────────────────────
    /// Rate limited by the cloud API (vendor code `5`).
    #[error("Rate limited by the cloud API")]
    RateLimited,

    /// Any other non-success vendor code.
    #[error("Cloud API error (code {code}): {message}")]
    Api { code: String, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error means the token is stale and a fresh
    /// login followed by one retry might resolve it.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::InvalidToken { .. })
    }

    /// Returns `true` if this is transient upstream instability — the
    /// class a circuit breaker should count.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            Self::RateLimited | Self::Api { .. } | Self::Deserialization { .. } => true,
            _ => false,
        }
    }

    /// Extract the vendor error code, if the response carried one.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::InvalidToken { code } | Self::Permission { code } | Self::Api { code, .. } => {
                Some(code)
            }
            Self::RateLimited => Some("5"),
            _ => None,
        }
    }
}
