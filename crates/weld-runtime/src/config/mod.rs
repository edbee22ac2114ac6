//! Configuration loading and schema.
//!
//! Configuration layers, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. Main config file (`weld.toml`)
//! 3. Profile config file (`weld.{profile}.toml`)
//! 4. Environment variables (`WELD_*`, `__` as section separator)
//!
//! ```rust,ignore
//! use weld_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load()?;
//! let config = ConfigLoader::new().profile("dev").load()?;
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{
    DispatchConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, PendingConfig, WeldConfig,
};
