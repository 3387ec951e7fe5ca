// Shared transport configuration for building reqwest::Client instances.
//
// The vendor cloud is a public HTTPS endpoint; all that varies is timeout
// tuning, so this stays deliberately small.

use std::time::Duration;

/// Transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Total per-request timeout (connect + transfer).
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .user_agent(concat!("marstek/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(crate::error::Error::Transport)?;
        Ok(client)
    }
}
