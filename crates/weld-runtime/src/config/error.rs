//! Configuration error types.

use thiserror::Error;

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source failed to load or deserialize.
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    /// The loaded configuration is inconsistent.
    #[error("invalid configuration: {message}")]
    Validation {
        /// What is wrong.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
