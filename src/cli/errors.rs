//! CLI-specific error types
//!
//! Startup errors (bad arguments, unreadable rules file, store that cannot
//! be opened) end the process. Command errors are printed and the session
//! continues.

use std::fmt;
use std::io;

use crate::storage::StoreError;
use crate::validation::RulesError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Startup configuration error
    ConfigError,
    /// I/O error (stdin/stdout or a transfer file)
    IoError,
    /// The store could not be opened
    StoreOpenFailed,
    /// A command line could not be parsed
    InvalidCommand,
    /// A store operation failed
    StoreFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FC_CLI_CONFIG_ERROR",
            Self::IoError => "FC_CLI_IO_ERROR",
            Self::StoreOpenFailed => "FC_CLI_STORE_OPEN_FAILED",
            Self::InvalidCommand => "FC_CLI_INVALID_COMMAND",
            Self::StoreFailed => "FC_CLI_STORE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    fatal: bool,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fatal: false,
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Store open failed
    pub fn store_open_failed(err: StoreError) -> Self {
        Self::new(CliErrorCode::StoreOpenFailed, err.to_string())
    }

    /// Unparseable command line
    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidCommand, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the session must stop
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<RulesError> for CliError {
    fn from(e: RulesError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self {
            fatal: e.is_fatal(),
            ..Self::new(CliErrorCode::StoreFailed, e.to_string())
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
