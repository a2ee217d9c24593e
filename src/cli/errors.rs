//! CLI-specific error types.

use std::fmt;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self {
            code: CliErrorCode::ConfigError,
            message: msg.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<crate::error::GatewayError> for CliError {
    fn from(e: crate::error::GatewayError) -> Self {
        Self::config_error(e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;
