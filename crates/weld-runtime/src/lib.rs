//! # Weld Runtime
//!
//! Runtime orchestration for the weld framework: configuration loading,
//! logging setup, and the event loop that feeds the dispatcher.
//!
//! A weld process wires up in three steps:
//!
//! ```rust,ignore
//! use weld_runtime::{ConfigLoader, EventLoop, logging};
//!
//! // 1. Configuration: weld.toml + WELD_* environment overrides
//! let config = ConfigLoader::new().load()?;
//!
//! // 2. Logging, driven by the configuration
//! logging::init_from_config(&config.logging);
//!
//! // 3. The event loop: transports push events in, the dispatcher fans
//! //    them out to handlers on concurrent tasks
//! let (event_loop, sink) = EventLoop::new(dispatcher, &config.dispatch);
//! tokio::spawn(transport.pump_into(sink));
//! event_loop.run_with_signals().await;
//! ```

pub mod config;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, DispatchConfig, LogFormat, LogLevel, LogOutput,
    LoggingConfig, PendingConfig, WeldConfig,
};
pub use logging::LoggingBuilder;
pub use runtime::{EventLoop, EventSink, RuntimeError};
