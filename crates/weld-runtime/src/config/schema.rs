//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use weld_framework::PendingStoreConfig;

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeldConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pending-request store policy.
    #[serde(default)]
    pub pending: PendingConfig,

    /// Event loop settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl WeldConfig {
    /// Checks the loaded configuration for inconsistencies.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pending.shards == 0 {
            return Err(ConfigError::validation("pending.shards must be at least 1"));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::validation(
                "dispatch.queue_capacity must be at least 1",
            ));
        }
        if self.logging.output == LogOutput::File && self.logging.file_path.is_none() {
            return Err(ConfigError::validation(
                "logging.output = \"file\" requires logging.file_path",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level (default).
    #[default]
    Info,
    /// Warn level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the lowercase level name.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line compact output (default).
    #[default]
    Compact,
    /// Full fmt output.
    Full,
    /// Multi-line human-oriented output.
    Pretty,
    /// JSON lines (requires the `json-log` feature).
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard output (default).
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// A log file; requires `file_path`.
    File,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file path when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module level overrides, e.g. `weld_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    /// Include thread ids in output.
    #[serde(default)]
    pub thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            filters: HashMap::new(),
            thread_ids: false,
        }
    }
}

// =============================================================================
// Pending store
// =============================================================================

/// Pending-request store policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingConfig {
    /// Number of shards.
    #[serde(default = "default_shards")]
    pub shards: usize,

    /// Per-entry time-to-live in seconds; absent means entries never expire.
    #[serde(default)]
    pub ttl_secs: Option<u64>,

    /// Approximate total entry bound; absent means unbounded.
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            shards: default_shards(),
            ttl_secs: None,
            capacity: None,
        }
    }
}

fn default_shards() -> usize {
    16
}

impl PendingConfig {
    /// Converts to the framework's store configuration.
    pub fn to_store_config(&self) -> PendingStoreConfig {
        PendingStoreConfig {
            shards: self.shards,
            ttl: self.ttl_secs.map(Duration::from_secs),
            capacity: self.capacity,
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Event loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Capacity of the inbound event queue; pushes beyond it apply
    /// backpressure to the transport.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    128
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WeldConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.pending.shards, 16);
        assert!(config.pending.ttl_secs.is_none());
        assert_eq!(config.dispatch.queue_capacity, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pending_to_store_config() {
        let pending = PendingConfig {
            shards: 4,
            ttl_secs: Some(300),
            capacity: Some(1000),
        };
        let store = pending.to_store_config();
        assert_eq!(store.shards, 4);
        assert_eq!(store.ttl, Some(Duration::from_secs(300)));
        assert_eq!(store.capacity, Some(1000));
    }

    #[test]
    fn test_validation_rejects_zero_shards() {
        let config = WeldConfig {
            pending: PendingConfig {
                shards: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_requires_file_path_for_file_output() {
        let config = WeldConfig {
            logging: LoggingConfig {
                output: LogOutput::File,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_serde_names() {
        let level: LogLevel = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(level, LogLevel::Debug);
        let format: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }
}
