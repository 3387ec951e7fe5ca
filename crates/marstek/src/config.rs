//! Glue between the config file and CLI flags.

use std::time::Duration;

use marstek_core::PollerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build a `PollerConfig` from the config file with CLI overrides applied.
pub fn resolve(global: &GlobalOpts) -> Result<PollerConfig, CliError> {
    let mut cfg = marstek_config::load_config_or_default();

    if let Some(ref email) = global.email {
        cfg.email = Some(email.clone());
    }
    if let Some(ref base_url) = global.base_url {
        cfg.base_url = base_url.clone();
    }

    Ok(marstek_config::to_poller_config(&cfg)?)
}

/// Like [`resolve`] but with a base interval override (for `watch -i`).
pub fn resolve_with_interval(
    global: &GlobalOpts,
    interval: Option<u64>,
) -> Result<PollerConfig, CliError> {
    let mut poller = resolve(global)?;
    if let Some(secs) = interval {
        poller.base_interval = Duration::from_secs(secs);
        poller.validate().map_err(|e| CliError::Validation {
            field: "interval".into(),
            reason: e.to_string(),
        })?;
    }
    Ok(poller)
}
