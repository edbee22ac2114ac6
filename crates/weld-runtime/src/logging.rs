//! Logging setup over `tracing` and `tracing-subscriber`.
//!
//! # Configuration-Based Initialization
//!
//! ```rust,ignore
//! use weld_runtime::{ConfigLoader, logging};
//!
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//! ```
//!
//! # Manual Initialization
//!
//! ```rust,ignore
//! use weld_runtime::logging::LoggingBuilder;
//!
//! LoggingBuilder::new()
//!     .with_level(tracing::Level::DEBUG)
//!     .directive("weld_framework=trace")
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig};

/// Initialize logging from a [`LoggingConfig`].
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// A builder for configuring the global tracing subscriber.
#[derive(Default)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: Option<tracing::Level>,
    format: LogFormat,
    output: LogOutput,
    with_target: bool,
    with_thread_ids: bool,
    file_path: Option<PathBuf>,
}

impl LoggingBuilder {
    /// Creates a builder with compact stdout output.
    pub fn new() -> Self {
        Self {
            with_target: true,
            ..Default::default()
        }
    }

    /// Creates a builder from a [`LoggingConfig`].
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();
        builder.level = Some(config.level.to_tracing_level());
        builder.format = config.format;
        builder.output = config.output;
        builder.with_thread_ids = config.thread_ids;
        builder.file_path.clone_from(&config.file_path);

        for (module, level) in &config.filters {
            builder
                .directives
                .push(format!("{}={}", module, level.as_str()));
        }

        builder
    }

    /// Sets the base log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds a filter directive, e.g. `"weld_framework=debug"`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Sets the output format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the output destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Includes the target (module path) in output.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Includes thread ids in output.
    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Sets the log file path for file output.
    pub fn file_path(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    /// Builds the filter from the level, `RUST_LOG`, and directives.
    fn build_filter(&self) -> EnvFilter {
        let base_level = self.level.unwrap_or(tracing::Level::INFO);
        let base_filter = base_level.to_string().to_lowercase();

        // RUST_LOG wins over the configured base level.
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base_filter));

        for directive in &self.directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }

        filter
    }

    /// Initialize the logging system, ignoring failure.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Try to initialize the logging system.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();

        macro_rules! init_with_writer {
            ($writer:expr) => {
                match &self.format {
                    #[cfg(feature = "json-log")]
                    LogFormat::Json => {
                        let layer = fmt::layer().json().with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    #[cfg(not(feature = "json-log"))]
                    LogFormat::Json => {
                        // Without the feature, fall back to compact rather
                        // than failing startup.
                        let layer = fmt::layer()
                            .compact()
                            .with_target(self.with_target)
                            .with_thread_ids(self.with_thread_ids)
                            .with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Compact => {
                        let layer = fmt::layer()
                            .compact()
                            .with_target(self.with_target)
                            .with_thread_ids(self.with_thread_ids)
                            .with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Full => {
                        let layer = fmt::layer()
                            .with_target(self.with_target)
                            .with_thread_ids(self.with_thread_ids)
                            .with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Pretty => {
                        let layer = fmt::layer()
                            .pretty()
                            .with_target(self.with_target)
                            .with_thread_ids(self.with_thread_ids)
                            .with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                }
            };
        }

        match &self.output {
            LogOutput::Stdout => init_with_writer!(std::io::stdout),
            LogOutput::Stderr => init_with_writer!(std::io::stderr),
            LogOutput::File => {
                if let Some(path) = &self.file_path {
                    let file_appender = tracing_appender::rolling::never(
                        path.parent().unwrap_or_else(|| Path::new(".")),
                        path.file_name().unwrap_or_else(|| OsStr::new("weld.log")),
                    );
                    init_with_writer!(file_appender)
                } else {
                    // Validation catches this for config-driven setup; manual
                    // builders fall back to stdout.
                    init_with_writer!(std::io::stdout)
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
