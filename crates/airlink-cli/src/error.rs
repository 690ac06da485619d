//! CLI error type with exit codes.

use thiserror::Error;

use airlink_core::WifiError;

/// Exit codes for scripting against the CLI.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const STATE: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Wifi(#[from] WifiError),

    #[error("no access point named '{essid}' was found")]
    ApNotFound { essid: String },

    #[error("timed out waiting for {what}")]
    Timeout { what: &'static str },

    #[error("configuration error: {0}")]
    Config(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Wifi(WifiError::InvalidOperation { .. } | WifiError::NoConnection) => {
                exit_code::STATE
            }
            Self::ApNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            _ => exit_code::GENERAL,
        }
    }
}
