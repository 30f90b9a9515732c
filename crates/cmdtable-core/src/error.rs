//! Error types for cmdtable-core
//!
//! Errors fall into three categories, each with its own exit code:
//! - **Validation**: bad input, bad config, bad command definitions (exit code 1)
//! - **Lookup**: a command or profile that does not exist (exit code 2)
//! - **System**: IO failures while loading configuration (exit code 3)

use thiserror::Error;

/// Core error type for command table operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Two parameters on one command share an internal name
    #[error("Duplicate argument '{name}' on command '{command}'")]
    DuplicateArgument { command: String, name: String },

    /// Two parameters on one command bind the same option flag
    #[error("Duplicate flag '{flag}' on command '{command}'")]
    DuplicateFlag { command: String, flag: String },

    /// Command, profile or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Argument values rejected by a validator
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Malformed API version string
    #[error("Invalid API version: {0}")]
    InvalidVersion(String),

    /// Invalid configuration values
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Malformed config file
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Filesystem errors
    #[error("IO error: {0}")]
    IoError(String),
}

impl Error {
    /// Create a validation error bound to a single argument.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Process exit code for this error's category.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DuplicateArgument { .. }
            | Self::DuplicateFlag { .. }
            | Self::Validation { .. }
            | Self::InvalidVersion(_)
            | Self::InvalidConfig(_)
            | Self::ParseError(_) => 1,
            Self::NotFound(_) => 2,
            Self::IoError(_) => 3,
        }
    }
}

/// Result type alias for cmdtable-core operations
pub type Result<T> = std::result::Result<T, Error>;
