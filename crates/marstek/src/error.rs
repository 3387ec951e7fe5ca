//! CLI error type and exit codes.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable hints.

use thiserror::Error;

use marstek_core::CoreError;

/// Exit codes for scripting.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NO_DATA: i32 = 4;
    pub const PERMISSION: i32 = 5;
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Authentication failed: {message}\nVerify your email and password, then run: marstek config set-password")]
    AuthFailed { message: String },

    #[error("The vendor denied access: {message}\nCheck that the account owns the devices in the Marstek app.")]
    Permission { message: String },

    #[error("No device data available: {reason}")]
    NoData { reason: String },

    #[error("{message}")]
    Core { message: String },

    #[error("Configuration error: {0}\nRun 'marstek config init --email <email>' to create a config file.")]
    Config(#[from] marstek_config::ConfigError),

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Permission { .. } => exit_code::PERMISSION,
            Self::NoData { .. } => exit_code::NO_DATA,
            Self::Config(_) | Self::Validation { .. } => exit_code::USAGE,
            Self::Core { .. } => exit_code::GENERAL,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { message } => Self::AuthFailed { message },
            CoreError::Permission { message } => Self::Permission { message },
            CoreError::NoData { reason } => Self::NoData { reason },
            other => Self::Core {
                message: other.to_string(),
            },
        }
    }
}
