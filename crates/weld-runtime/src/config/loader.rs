//! Configuration loader built on figment.
//!
//! Sources are layered, lowest to highest priority: built-in defaults, the
//! main TOML file, a profile TOML file, then `WELD_*` environment variables
//! with `__` separating sections (`WELD_LOGGING__LEVEL=debug` sets
//! `logging.level`). Missing files are fine; the defaults stand in.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::debug;

use super::error::ConfigResult;
use super::schema::WeldConfig;

/// Default config file name searched in the working directory.
const DEFAULT_FILE: &str = "weld.toml";

/// Layered configuration loader.
///
/// # Example
///
/// ```rust,ignore
/// let config = ConfigLoader::new().load()?;
/// let config = ConfigLoader::new()
///     .file("config/weld.toml")
///     .profile("dev")
///     .load()?;
/// ```
pub struct ConfigLoader {
    file: PathBuf,
    profile: Option<String>,
    with_env: bool,
}

impl ConfigLoader {
    /// Creates a loader over `weld.toml` in the working directory.
    pub fn new() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_FILE),
            profile: None,
            with_env: true,
        }
    }

    /// Sets the main config file path.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = path.as_ref().to_path_buf();
        self
    }

    /// Sets a profile; `weld.{profile}.toml` next to the main file overrides
    /// it when present.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Disables `WELD_*` environment variable overrides.
    pub fn without_env(mut self) -> Self {
        self.with_env = false;
        self
    }

    fn profile_file(&self) -> Option<PathBuf> {
        let profile = self.profile.as_deref()?;
        let stem = self.file.file_stem()?.to_str()?;
        Some(self.file.with_file_name(format!("{stem}.{profile}.toml")))
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<WeldConfig> {
        let mut figment = Figment::from(Serialized::defaults(WeldConfig::default()))
            .merge(Toml::file(&self.file));

        if let Some(profile_file) = self.profile_file() {
            debug!(file = %profile_file.display(), "Merging profile configuration");
            figment = figment.merge(Toml::file(profile_file));
        }

        if self.with_env {
            figment = figment.merge(Env::prefixed("WELD_").split("__"));
        }

        let config: WeldConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, LogLevel};

    struct TempToml(PathBuf);

    impl TempToml {
        fn write(name: &str, contents: &str) -> Self {
            let path = std::env::temp_dir().join(format!("weld-test-{}-{name}", std::process::id()));
            std::fs::write(&path, contents).unwrap();
            Self(path)
        }
    }

    impl Drop for TempToml {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ConfigLoader::new()
            .file("/nonexistent/weld.toml")
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.pending.shards, 16);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = TempToml::write(
            "main.toml",
            r#"
            [logging]
            level = "debug"
            format = "pretty"

            [pending]
            shards = 4
            ttl_secs = 600

            [dispatch]
            queue_capacity = 32
            "#,
        );

        let config = ConfigLoader::new()
            .file(&file.0)
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.pending.shards, 4);
        assert_eq!(config.pending.ttl_secs, Some(600));
        assert_eq!(config.dispatch.queue_capacity, 32);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let file = TempToml::write(
            "invalid.toml",
            r#"
            [dispatch]
            queue_capacity = 0
            "#,
        );

        let result = ConfigLoader::new().file(&file.0).without_env().load();
        assert!(result.is_err());
    }
}
